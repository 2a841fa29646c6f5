use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BODY_COUNT, DEFAULT_CHUNK_SIZE};

/// Simulation configuration, fixed for the lifetime of an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of bodies (N)
    pub body_count: u32,
    /// Bodies handed to the force kernel per dispatch
    pub chunk_size: u32,
    /// Velocity multiplier applied after each integration step
    pub damping: f32,
    /// Softening length squared, added to every squared pair distance
    pub softening_sqr: f32,
    /// Overall radius scale of a seeded galaxy
    pub cluster_scale: f32,
    /// Orbital speed scale of a seeded galaxy
    pub velocity_scale: f32,
    /// Simulation time of one sweep at 100% speed
    pub sim_interval: f32,
    /// Bodies of different partitions closer than this merge when collisions are on
    pub collision_distance: f32,
    /// Sweeps between damping flips to 1/damping (0 = constant damping)
    pub damping_period: u32,
    /// Kernel time per chunk above which a stutter warning is logged
    pub frame_budget_ms: f32,
    /// Longest wait on an outstanding dispatch before reporting a stall
    pub stall_timeout_ms: u64,
    /// Run kernel dispatches on the async compute pool instead of inline
    pub async_dispatch: bool,
    /// Random seed for deterministic generation
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            body_count: DEFAULT_BODY_COUNT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            damping: 0.999,
            softening_sqr: 0.128,
            cluster_scale: 0.035,
            velocity_scale: 4000.0,
            sim_interval: 0.000256,
            collision_distance: 0.002,
            damping_period: 0,
            frame_budget_ms: 16.0,
            stall_timeout_ms: 2000,
            async_dispatch: true,
            seed: 42,
        }
    }
}

impl SimConfig {
    /// Slots per buffer: body count rounded up to a whole number of chunks
    pub fn capacity(&self) -> usize {
        let chunk = self.chunk_size as usize;
        (self.body_count as usize).div_ceil(chunk) * chunk
    }

    /// Dispatches needed for one full sweep
    pub fn chunks_per_sweep(&self) -> usize {
        (self.body_count as usize).div_ceil(self.chunk_size as usize)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.body_count < 2 {
            return Err(format!("body_count must be at least 2, got {}", self.body_count));
        }
        if self.chunk_size == 0 {
            return Err("chunk_size must be non-zero".to_string());
        }
        if self.chunk_size > self.body_count {
            return Err(format!(
                "chunk_size {} exceeds body_count {}",
                self.chunk_size, self.body_count
            ));
        }
        if !(self.damping > 0.0 && self.damping.is_finite()) {
            return Err(format!("damping must be positive, got {}", self.damping));
        }
        if !(self.softening_sqr > 0.0) {
            return Err(format!("softening_sqr must be positive, got {}", self.softening_sqr));
        }
        if !(self.sim_interval > 0.0) {
            return Err(format!("sim_interval must be positive, got {}", self.sim_interval));
        }
        if self.collision_distance < 0.0 {
            return Err(format!(
                "collision_distance must not be negative, got {}",
                self.collision_distance
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capacity(), 32_768);
        assert_eq!(config.chunks_per_sweep(), 16);
    }

    #[test]
    fn test_capacity_pads_to_whole_chunks() {
        let config = SimConfig { body_count: 1000, chunk_size: 256, ..SimConfig::default() };
        assert_eq!(config.capacity(), 1024);
        assert_eq!(config.chunks_per_sweep(), 4);

        let exact = SimConfig { body_count: 1024, chunk_size: 256, ..SimConfig::default() };
        assert_eq!(exact.capacity(), 1024);
    }

    #[test]
    fn test_rejects_bad_chunking() {
        let zero = SimConfig { chunk_size: 0, ..SimConfig::default() };
        assert!(zero.validate().is_err());

        let oversized = SimConfig { body_count: 16, chunk_size: 32, ..SimConfig::default() };
        assert!(oversized.validate().is_err());
    }
}
