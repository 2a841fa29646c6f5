//! Seed every built-in model, run a few sweeps headless and report how well
//! mass, momentum and energy hold up.

use bevy::math::Mat4;
use starfield_core::{Body, SimConfig};
use starfield_physics::diagnostics;
use starfield_sim::Engine;

const SWEEPS: usize = 8;

struct Sample {
    mass: f64,
    momentum: f64,
    kinetic: f64,
    extent: f64,
}

impl Sample {
    fn of(bodies: &[Body]) -> Self {
        let p = diagnostics::momentum(bodies);
        Self {
            mass: diagnostics::total_mass(bodies),
            momentum: (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt(),
            kinetic: diagnostics::kinetic_energy(bodies),
            extent: diagnostics::extent(bodies, diagnostics::center_of_mass(bodies)),
        }
    }
}

fn relative(before: f64, after: f64) -> f64 {
    if before == 0.0 {
        after.abs()
    } else {
        (after - before) / before
    }
}

fn main() {
    let config = SimConfig {
        body_count: 2048,
        chunk_size: 256,
        async_dispatch: false,
        ..SimConfig::default()
    };
    let mut engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("Failed to build engine: {err}");
            std::process::exit(1);
        }
    };
    let chunks = engine.config().chunks_per_sweep();
    let models = engine.scenarios().len();

    eprintln!(
        "Surveying {} models, {} bodies, {} sweeps each...",
        models,
        engine.body_count(),
        SWEEPS
    );

    println!(
        "{:<3} {:<46} {:>5} {:>10} {:>10} {:>10} {:>9} {:>9}",
        "#", "model", "parts", "mass", "dmass", "|p|", "dKE", "extent"
    );

    for model in 0..models {
        if let Err(err) = engine.seed(model, Mat4::IDENTITY) {
            eprintln!("Model {model}: {err}");
            continue;
        }
        let before = Sample::of(engine.stable_buffer_b());

        let mut failed = false;
        for _ in 0..SWEEPS * chunks {
            if let Err(err) = engine.advance() {
                eprintln!("Model {model}: {err}");
                failed = true;
                break;
            }
        }
        if failed {
            continue;
        }
        let after = Sample::of(engine.stable_buffer_b());

        println!(
            "{:<3} {:<46} {:>5} {:>10.1} {:>10.2e} {:>10.3e} {:>9.3} {:>9.3}",
            model,
            engine.scenarios()[model].name,
            engine.partition_count(),
            after.mass,
            relative(before.mass, after.mass),
            after.momentum,
            relative(before.kinetic, after.kinetic),
            after.extent,
        );
    }
}
