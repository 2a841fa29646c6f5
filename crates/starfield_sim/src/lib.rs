pub mod buffers;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod scenario;

pub use buffers::{ParticleBuffer, Role, RoleTable, TripleBuffer};
pub use engine::{Engine, GateGuard};
pub use error::EngineError;
pub use params::{SimulationParameters, SweepSnapshot, TrackTarget};
pub use pipeline::SimulationPlugin;
pub use scenario::Scenario;
