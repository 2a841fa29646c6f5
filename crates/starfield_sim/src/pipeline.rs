use bevy::prelude::*;

use super::engine::Engine;

/// Bevy plugin driving the engine once per frame
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, simulation_tick.run_if(resource_exists::<Engine>));
    }
}

/// Main simulation tick: dispatch the next chunk
fn simulation_tick(mut engine: ResMut<Engine>) {
    if let Err(err) = engine.advance() {
        warn!("Simulation step failed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starfield_core::SimConfig;

    #[test]
    fn test_plugin_advances_engine() {
        let config = SimConfig {
            body_count: 16,
            chunk_size: 4,
            async_dispatch: false,
            ..SimConfig::default()
        };
        let mut app = App::new();
        app.add_plugins(SimulationPlugin);
        app.insert_resource(Engine::new(config).unwrap());

        for _ in 0..4 {
            app.update();
        }
        let engine = app.world().resource::<Engine>();
        assert_eq!(engine.sweeps(), 1);
        assert_eq!(engine.cursor(), 0);
    }

    #[test]
    fn test_plugin_without_engine_is_idle() {
        let mut app = App::new();
        app.add_plugins(SimulationPlugin);
        app.update();
        assert!(app.world().get_resource::<Engine>().is_none());
    }
}
