// Simulation units: G = 1, and a freshly seeded galaxy spans a few tenths of a
// world unit so it fits a viewing volume about a metre across.

/// Gravitational constant in simulation units
pub const G: f32 = 1.0;

/// Bodies simulated by default
pub const DEFAULT_BODY_COUNT: u32 = 32_768;

/// Bodies per kernel dispatch. 2048 of 32768 keeps one dispatch inside a 60 Hz frame
/// on the reference hardware; halve it when doubling the body count.
pub const DEFAULT_CHUNK_SIZE: u32 = 2048;

/// Central mass of a generated galaxy is this fraction of the rest of its bodies
pub const CENTRAL_MASS_DIVISOR: f32 = 400.0;

/// Inner edge of the seeded disk, in units of the galaxy scale
pub const DISK_INNER_RADIUS: f32 = 2.5;

/// Outer edge of the seeded disk, in units of the galaxy scale
pub const DISK_OUTER_RADIUS: f32 = 4.0;

/// Radius proxies are drawn as 1/u with u in this range, giving sizes 1..~2.15
/// and masses differing by a factor of ~10 at most.
pub const RADIUS_DRAW_MIN: f32 = 0.465;

/// Threshold for treating a direction as parallel to the principal rotation axis
pub const AXIS_PARALLEL_EPSILON: f32 = 1e-6;

/// Bodies within this angular band of the rotation axis are compressed into the bar
pub const BAR_BAND: f32 = 0.5;

/// Distance in front of the viewpoint at which galaxies are placed
pub const VIEW_DISTANCE: f32 = 0.5;

/// Fraction of the tracked body's position removed per sweep while tracking
pub const TRACK_SPEED: f32 = 0.1;

/// Live squeeze ("pinch") is clamped to this range
pub const SQUEEZE_MIN: f32 = 0.9;
pub const SQUEEZE_MAX: f32 = 1.1;

/// Bodies placed per paint stroke while halted
pub const PAINT_STROKE: usize = 8;
