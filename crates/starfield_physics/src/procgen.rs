use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use bevy::math::{EulerRot, Mat4, Vec3, Vec4};
use rand::Rng;
use starfield_core::constants::*;
use starfield_core::{Body, SimConfig};

/// Knobs for a single generated disk galaxy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalaxyShape {
    /// z scale of the disk, 1.0 leaves it spherical
    pub flatten: f32,
    /// Size relative to the cluster scale
    pub prescale: f32,
    /// Orbital speed relative to the velocity scale
    pub vrescale: f32,
    /// Per-axis jitter of orbital speed
    pub vrandomness: f32,
    /// Bar stretch along y
    pub squeeze: f32,
    pub collide: bool,
}

impl Default for GalaxyShape {
    fn default() -> Self {
        Self {
            flatten: 1.0,
            prescale: 1.0,
            vrescale: 1.0,
            vrandomness: 0.0,
            squeeze: 1.0,
            collide: false,
        }
    }
}

/// Scale factors shared by every galaxy of one engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalaxyScale {
    pub cluster: f32,
    pub velocity: f32,
}

impl GalaxyScale {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            cluster: config.cluster_scale,
            velocity: config.velocity_scale,
        }
    }
}

/// Where a galaxy lands: one transform for positions and one for velocities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Mat4,
    pub velocity: Mat4,
}

impl Placement {
    pub const IDENTITY: Placement = Placement {
        position: Mat4::IDENTITY,
        velocity: Mat4::IDENTITY,
    };

    /// Place a galaxy at `offset` from the point `VIEW_DISTANCE` in front of
    /// `viewpoint`, oriented by the Euler angles `axis` (about z, y, x) and
    /// drifting with `velocity_offset` in cluster velocity units.
    ///
    /// Positions go through the full view transform. Velocities get the view
    /// rotation only: the viewpoint translation and the `VIEW_DISTANCE` front
    /// offset are displacements, and adding them to a velocity would give every
    /// galaxy seeded away from the origin a spurious bulk drift.
    pub fn in_front_of(
        viewpoint: Mat4,
        offset: Vec3,
        velocity_offset: Vec3,
        axis: Vec3,
        scale: &GalaxyScale,
    ) -> Self {
        let rotation = euler_rotation(axis);
        let front = viewpoint * Mat4::from_translation(Vec3::new(0.0, 0.0, -VIEW_DISTANCE));
        let (_, view_rotation, _) = viewpoint.to_scale_rotation_translation();

        let drift = velocity_offset * scale.cluster * scale.velocity;
        Self {
            position: front * Mat4::from_translation(offset) * rotation,
            velocity: Mat4::from_quat(view_rotation) * Mat4::from_translation(drift) * rotation,
        }
    }

    /// Transform a body, keeping its radius proxy
    pub fn apply(&self, body: &Body) -> Body {
        let p = self.position * Vec4::new(body.position[0], body.position[1], body.position[2], 1.0);
        let v = self.velocity * Vec4::new(body.velocity[0], body.velocity[1], body.velocity[2], 1.0);
        Body::new(p.truncate().to_array(), v.truncate().to_array(), body.radius())
    }
}

/// Rotation from Euler angles (alpha about z, beta about y, gamma about x)
pub fn euler_rotation(axis: Vec3) -> Mat4 {
    Mat4::from_euler(EulerRot::ZYX, axis.x, axis.y, axis.z)
}

/// Result of one generated galaxy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalaxySummary {
    /// Sum of the disk bodies' radius proxies
    pub total_mass: f32,
    pub central_radius: f32,
}

/// Uniformly distributed direction
pub fn random_unit_vector(rng: &mut impl Rng) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let ring = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(ring * theta.cos(), ring * theta.sin(), z)
}

/// Axis the orbital velocity is built around for a normalized position.
/// z, unless the position lies along z, where any perpendicular axis is used.
pub fn orbital_axis(direction: Vec3) -> Vec3 {
    let cos_theta = direction.dot(Vec3::Z);
    if (1.0 - cos_theta.abs()) < AXIS_PARALLEL_EPSILON {
        direction.any_orthonormal_vector()
    } else {
        Vec3::Z
    }
}

fn disk_body(
    shape: &GalaxyShape,
    inner: f32,
    outer: f32,
    vscale: f32,
    rng: &mut impl Rng,
) -> Body {
    let direction = random_unit_vector(rng);
    let spread = random_unit_vector(rng).abs();
    let radius = 1.0 / rng.gen_range(RADIUS_DRAW_MIN..=1.0);

    let mut position = direction * (Vec3::splat(inner) + (outer - inner) * spread);
    position.z *= shape.flatten;

    let heading = position.normalize_or_zero();
    let jitter = Vec3::ONE + shape.vrandomness * random_unit_vector(rng);
    let mut velocity = heading.cross(orbital_axis(heading)) * jitter * vscale;
    velocity.x /= shape.squeeze;
    velocity.y *= shape.squeeze;

    // Bar: one cap of the unflattened sphere is pulled in along y
    if 1.0 - direction.z < BAR_BAND {
        position.y /= shape.squeeze;
    }

    Body::new(position.to_array(), velocity.to_array(), radius)
}

/// Fill `range` with one disk galaxy.
///
/// The first index becomes a massless anchor at the galaxy origin and the last
/// index a heavy central body sized from the disk's total mass. Everything is
/// transformed by `placement` afterwards.
pub fn generate_galaxy(
    bodies: &mut [Body],
    range: RangeInclusive<usize>,
    shape: &GalaxyShape,
    scale: &GalaxyScale,
    placement: &Placement,
    rng: &mut impl Rng,
) -> GalaxySummary {
    let (first, last) = (*range.start(), *range.end());
    assert!(
        first < last,
        "galaxy {first}..={last} needs room for an anchor and a central body"
    );
    assert!(
        last < bodies.len(),
        "galaxy {first}..={last} exceeds {} bodies",
        bodies.len()
    );

    let pscale = scale.cluster * shape.prescale;
    let vscale = scale.velocity * pscale * shape.vrescale;
    let inner = DISK_INNER_RADIUS * pscale;
    let outer = DISK_OUTER_RADIUS * pscale;

    let mut total_mass = 0.0;
    for body in &mut bodies[first + 1..last] {
        *body = disk_body(shape, inner, outer, vscale, rng);
        total_mass += body.radius();
    }

    let central_radius = (total_mass / CENTRAL_MASS_DIVISOR).cbrt();
    bodies[first] = Body::ZERO;
    bodies[last] = Body::new([0.0; 3], [0.0; 3], central_radius);

    for body in &mut bodies[range] {
        *body = placement.apply(body);
    }

    GalaxySummary {
        total_mass,
        central_radius,
    }
}

/// Lay `range` evenly along the segment from `from` (exclusive) to `to` (inclusive),
/// at rest, with fresh radius draws.
pub fn paint_line(
    bodies: &mut [Body],
    range: RangeInclusive<usize>,
    from: Vec3,
    to: Vec3,
    rng: &mut impl Rng,
) {
    let (first, last) = (*range.start(), *range.end());
    assert!(first <= last && last < bodies.len(), "paint stroke {first}..={last} out of bounds");

    let steps = (last + 1 - first) as f32;
    for (k, body) in bodies[range].iter_mut().enumerate() {
        let t = (k + 1) as f32 / steps;
        let radius = 1.0 / rng.gen_range(RADIUS_DRAW_MIN..=1.0);
        *body = Body::new(from.lerp(to, t).to_array(), [0.0; 3], radius);
    }
}

/// Zero the bodies in `range`: massless and at rest at the origin
pub fn clear_range(bodies: &mut [Body], range: RangeInclusive<usize>) {
    bodies[range].fill(Body::ZERO);
}
