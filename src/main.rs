use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use starfield_core::SimConfig;
use starfield_physics::diagnostics;
use starfield_sim::{Engine, SimulationPlugin};

/// Sweeps between progress reports
const REPORT_EVERY: u64 = 50;

fn main() {
    let config = SimConfig {
        body_count: 8192,
        chunk_size: 512,
        ..SimConfig::default()
    };

    let mut engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("Failed to start the simulation: {err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = engine.seed(0, Mat4::IDENTITY) {
        eprintln!("Failed to seed the first model: {err}");
        std::process::exit(1);
    }

    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
        )
        .add_plugins(LogPlugin::default())
        .insert_resource(engine)
        .add_plugins(SimulationPlugin)
        .add_systems(Update, report_progress)
        .run();
}

/// Log a short summary of the stable state every few sweeps
fn report_progress(engine: Res<Engine>, mut last: Local<u64>) {
    let sweeps = engine.sweeps();
    if sweeps == *last || sweeps % REPORT_EVERY != 0 {
        return;
    }
    *last = sweeps;

    let bodies = engine.stable_buffer_b();
    info!(
        "Sweep {}: t = {:.4}, mass {:.1}, kinetic {:.3e}, extent {:.3}",
        sweeps,
        engine.simulation_time(),
        diagnostics::total_mass(bodies),
        diagnostics::kinetic_energy(bodies),
        diagnostics::extent(bodies, diagnostics::center_of_mass(bodies)),
    );
}
