pub mod collision;
pub mod diagnostics;
pub mod forces;
pub mod kernel;
pub mod procgen;

pub use kernel::{ChunkInput, DirectKernel, ForceKernel, KernelParams, Tracking};
pub use procgen::{GalaxyScale, GalaxyShape, GalaxySummary, Placement};
