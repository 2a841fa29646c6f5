use std::ops::Range;

use bevy::tasks::{ComputeTaskPool, ParallelSliceMut};
use starfield_core::{Body, Partitions};

use crate::collision;
use crate::forces::{gravity_acceleration, squeeze_acceleration};

/// Bodies per parallel lane when a chunk is fanned out over the compute pool
const LANE: usize = 64;

/// Per-sweep parameter snapshot read by the kernel.
/// Taken once when a sweep begins and never mutated while the sweep runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelParams {
    /// Integration step (base interval scaled by speed)
    pub timestep: f32,
    /// Velocity multiplier after integration
    pub damping: f32,
    pub softening_sqr: f32,
    /// Gravity strength as a fraction, 1.0 = 100%
    pub gravity: f32,
    pub squeeze: f32,
    pub collide: bool,
    pub collision_distance: f32,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            timestep: 0.000256,
            damping: 1.0,
            softening_sqr: 0.128,
            gravity: 1.0,
            squeeze: 1.0,
            collide: false,
            collision_distance: 0.002,
        }
    }
}

/// Spectator movement removed from every body once per sweep
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tracking {
    pub position: [f32; 4],
    pub velocity: [f32; 4],
}

impl Tracking {
    pub fn accumulate(&mut self, position: [f32; 4], velocity: [f32; 4]) {
        for k in 0..4 {
            self.position[k] += position[k];
            self.velocity[k] += velocity[k];
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Tracking::default()
    }
}

/// Everything one dispatch may read
pub struct ChunkInput<'a> {
    /// Full "old" state, one entry per body (padding excluded)
    pub old: &'a [Body],
    /// Bodies to advance in this dispatch
    pub range: Range<usize>,
    pub params: &'a KernelParams,
    pub tracking: &'a Tracking,
    pub partitions: &'a Partitions,
}

/// Computes the next state for one chunk of bodies.
///
/// Body `input.range.start + k` is written to `out[k]`. The result for a body may
/// depend only on `input`, never on other entries of `out` or on earlier dispatches,
/// so chunks can be evaluated in any order and a chunk's bodies in parallel.
pub trait ForceKernel: Send + Sync + 'static {
    fn compute_chunk(&self, input: &ChunkInput<'_>, out: &mut [Body]);
}

/// Brute-force all-pairs kernel with softened gravity and explicit Euler steps
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectKernel;

impl DirectKernel {
    /// Next state of body `i`
    pub fn step_body(&self, input: &ChunkInput<'_>, i: usize) -> Body {
        let params = input.params;
        let mut body = input.old[i];
        let mut partner = None;

        if params.collide {
            if let Some(merge) =
                collision::resolve(input.old, i, input.partitions, params.collision_distance)
            {
                body = merge.body;
                partner = Some(merge.partner);
            }
        }

        let mut acc = [0.0f32; 3];
        if params.gravity != 0.0 {
            let pos = body.pos();
            for (j, other) in input.old.iter().enumerate() {
                if j == i || Some(j) == partner || other.is_massless() {
                    continue;
                }
                let a = gravity_acceleration(pos, other.pos(), other.mass(), params.softening_sqr);
                acc[0] += a[0];
                acc[1] += a[1];
                acc[2] += a[2];
            }
            acc = squeeze_acceleration(acc.map(|a| a * params.gravity), params.squeeze);
        }

        let dt = params.timestep;
        let tracking = input.tracking;
        let mut next = body;
        for k in 0..3 {
            let v = (body.velocity[k] + acc[k] * dt) * params.damping;
            next.position[k] = body.position[k] + v * dt - tracking.position[k];
            next.velocity[k] = v - tracking.velocity[k];
        }
        next
    }
}

impl ForceKernel for DirectKernel {
    fn compute_chunk(&self, input: &ChunkInput<'_>, mut out: &mut [Body]) {
        assert_eq!(
            out.len(),
            input.range.len(),
            "output slice must match chunk {:?}",
            input.range
        );
        let begin = input.range.start;

        match ComputeTaskPool::try_get() {
            Some(pool) if out.len() > LANE => {
                out.par_chunk_map_mut(pool, LANE, |lane, bodies| {
                    let base = begin + lane * LANE;
                    for (k, body) in bodies.iter_mut().enumerate() {
                        *body = self.step_body(input, base + k);
                    }
                });
            }
            _ => {
                for (k, body) in out.iter_mut().enumerate() {
                    *body = self.step_body(input, begin + k);
                }
            }
        }
    }
}
