use serde::{Deserialize, Serialize};
use starfield_core::constants::{SQUEEZE_MAX, SQUEEZE_MIN};
use starfield_core::SimConfig;
use starfield_physics::{KernelParams, Tracking};

/// Body the spectator follows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackTarget {
    #[default]
    None,
    /// Central mass of the most recent galaxy (body N-1)
    Primary,
    /// Central mass of the previous galaxy (body split-1)
    Secondary,
    /// Midpoint of primary and secondary
    Barycenter,
}

impl TrackTarget {
    pub fn next(self) -> Self {
        match self {
            TrackTarget::None => TrackTarget::Primary,
            TrackTarget::Primary => TrackTarget::Secondary,
            TrackTarget::Secondary => TrackTarget::Barycenter,
            TrackTarget::Barycenter => TrackTarget::None,
        }
    }
}

/// Live, externally editable parameters. Read by the kernel only through the
/// snapshot taken when a sweep begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub speed_percent: f32,
    pub gravity_percent: f32,
    /// Anisotropic acceleration factor, clamped to [0.9, 1.1]
    pub squeeze: f32,
    pub collide: bool,
    pub track: TrackTarget,
    /// Spectator movement accumulated since the last sweep began
    #[serde(skip)]
    pub movement: Tracking,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            speed_percent: 100.0,
            gravity_percent: 100.0,
            squeeze: 1.0,
            collide: false,
            track: TrackTarget::None,
            movement: Tracking::default(),
        }
    }
}

impl SimulationParameters {
    pub fn set_squeeze(&mut self, squeeze: f32) {
        self.squeeze = squeeze.clamp(SQUEEZE_MIN, SQUEEZE_MAX);
    }

    /// Defaults restored by every galaxy seed
    pub fn reset_for_seed(&mut self, collide: bool) {
        self.track = TrackTarget::None;
        self.speed_percent = 100.0;
        self.gravity_percent = 100.0;
        self.squeeze = 1.0;
        self.collide = collide;
    }

    /// Kernel parameters for sweep number `sweep`
    pub fn kernel_params(&self, config: &SimConfig, sweep: u64) -> KernelParams {
        let period = config.damping_period as u64;
        let damping = if period > 0 && (sweep / period) % 2 == 1 {
            1.0 / config.damping
        } else {
            config.damping
        };

        KernelParams {
            timestep: config.sim_interval * self.speed_percent / 100.0,
            damping,
            softening_sqr: config.softening_sqr,
            gravity: self.gravity_percent / 100.0,
            squeeze: self.squeeze,
            collide: self.collide,
            collision_distance: config.collision_distance,
        }
    }
}

/// Immutable copy of everything the kernel reads during one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SweepSnapshot {
    pub kernel: KernelParams,
    pub tracking: Tracking,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_cycle_wraps() {
        let mut track = TrackTarget::None;
        for _ in 0..4 {
            track = track.next();
        }
        assert_eq!(track, TrackTarget::None);
        assert_eq!(TrackTarget::Primary.next(), TrackTarget::Secondary);
    }

    #[test]
    fn test_squeeze_is_clamped() {
        let mut params = SimulationParameters::default();
        params.set_squeeze(2.0);
        assert_eq!(params.squeeze, 1.1);
        params.set_squeeze(0.0);
        assert_eq!(params.squeeze, 0.9);
        params.set_squeeze(1.05);
        assert_eq!(params.squeeze, 1.05);
    }

    #[test]
    fn test_kernel_params_scale_with_percentages() {
        let config = SimConfig::default();
        let params = SimulationParameters {
            speed_percent: 50.0,
            gravity_percent: 200.0,
            ..SimulationParameters::default()
        };
        let kernel = params.kernel_params(&config, 0);
        assert!((kernel.timestep - config.sim_interval * 0.5).abs() < 1e-9);
        assert_eq!(kernel.gravity, 2.0);
        assert_eq!(kernel.damping, config.damping);
    }

    #[test]
    fn test_damping_alternates_with_period() {
        let config = SimConfig { damping_period: 2, ..SimConfig::default() };
        let params = SimulationParameters::default();
        let damping: Vec<f32> = (0..6).map(|s| params.kernel_params(&config, s).damping).collect();
        let inverse = 1.0 / config.damping;
        assert_eq!(damping, vec![0.999, 0.999, inverse, inverse, 0.999, 0.999]);
    }

    #[test]
    fn test_seed_reset() {
        let mut params = SimulationParameters {
            speed_percent: 10.0,
            gravity_percent: 0.0,
            squeeze: 1.1,
            collide: false,
            track: TrackTarget::Barycenter,
            movement: Tracking::default(),
        };
        params.reset_for_seed(true);
        assert_eq!(params.track, TrackTarget::None);
        assert_eq!(params.speed_percent, 100.0);
        assert_eq!(params.gravity_percent, 100.0);
        assert_eq!(params.squeeze, 1.0);
        assert!(params.collide);
    }
}
