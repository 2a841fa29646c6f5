//! Named starting models, described as data.
//!
//! A scenario is a list of steps over fractions of the body range. Each step
//! either seeds one galaxy or zeroes its span; galaxy knobs are fixed values or
//! uniform draws made when the scenario is seeded.

use std::f32::consts::{FRAC_PI_2, PI};
use std::ops::RangeInclusive;

use bevy::math::Vec3;
use rand::Rng;
use starfield_physics::GalaxyShape;

/// A scalar knob: fixed, or drawn uniformly from an inclusive range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Fixed(f32),
    Uniform(f32, f32),
}

impl Sample {
    pub fn draw(&self, rng: &mut impl Rng) -> f32 {
        match *self {
            Sample::Fixed(value) => value,
            Sample::Uniform(low, high) => rng.gen_range(low..=high),
        }
    }
}

fn fixed3(x: f32, y: f32, z: f32) -> [Sample; 3] {
    [Sample::Fixed(x), Sample::Fixed(y), Sample::Fixed(z)]
}

fn draw3(samples: &[Sample; 3], rng: &mut impl Rng) -> Vec3 {
    Vec3::new(samples[0].draw(rng), samples[1].draw(rng), samples[2].draw(rng))
}

/// Arguments for one generated galaxy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalaxyRecipe {
    pub offset: [Sample; 3],
    /// Euler angles (about z, y, x)
    pub axis: [Sample; 3],
    pub velocity_offset: Vec3,
    pub flatten: Sample,
    pub squeeze: Sample,
    pub prescale: f32,
    pub vrescale: f32,
    pub vrandomness: f32,
    pub collide: bool,
}

impl Default for GalaxyRecipe {
    fn default() -> Self {
        Self {
            offset: fixed3(0.0, 0.0, 0.0),
            axis: fixed3(0.0, 0.0, 0.0),
            velocity_offset: Vec3::ZERO,
            flatten: Sample::Fixed(1.0),
            squeeze: Sample::Fixed(1.0),
            prescale: 1.0,
            vrescale: 1.0,
            vrandomness: 0.0,
            collide: false,
        }
    }
}

/// A recipe with every knob drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalaxyDraw {
    pub offset: Vec3,
    pub axis: Vec3,
    pub velocity_offset: Vec3,
    pub shape: GalaxyShape,
}

impl GalaxyRecipe {
    fn flat() -> Self {
        Self {
            flatten: Sample::Fixed(0.05),
            squeeze: Sample::Fixed(2.0),
            ..Self::default()
        }
    }

    fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.offset = fixed3(x, y, z);
        self
    }

    fn turned(mut self, alpha: f32, beta: f32, gamma: f32) -> Self {
        self.axis = fixed3(alpha, beta, gamma);
        self
    }

    /// Small galaxy with random placement, orientation and shape
    fn scattered(prescale: f32) -> Self {
        Self {
            offset: [
                Sample::Uniform(-0.2, 0.2),
                Sample::Uniform(-0.2, 0.2),
                Sample::Uniform(-0.3, 0.0),
            ],
            axis: [Sample::Uniform(0.0, PI); 3],
            flatten: Sample::Uniform(0.05, 1.0),
            squeeze: Sample::Uniform(1.0, 2.0),
            prescale,
            ..Self::default()
        }
    }

    pub fn draw(&self, rng: &mut impl Rng) -> GalaxyDraw {
        let offset = draw3(&self.offset, rng);
        let axis = draw3(&self.axis, rng);
        let shape = GalaxyShape {
            flatten: self.flatten.draw(rng),
            prescale: self.prescale,
            vrescale: self.vrescale,
            vrandomness: self.vrandomness,
            squeeze: self.squeeze.draw(rng),
            collide: self.collide,
        };
        GalaxyDraw {
            offset,
            axis,
            velocity_offset: self.velocity_offset,
            shape,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepKind {
    Galaxy(GalaxyRecipe),
    /// Zero mass, zero velocity
    Clear,
}

/// One step over the body fractions `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub from: f32,
    pub to: f32,
    pub kind: StepKind,
}

impl Step {
    fn galaxy(from: f32, to: f32, recipe: GalaxyRecipe) -> Self {
        Self { from, to, kind: StepKind::Galaxy(recipe) }
    }

    /// Inclusive body range of this step for `body_count` bodies
    pub fn range(&self, body_count: usize) -> RangeInclusive<usize> {
        let first = (body_count as f64 * self.from as f64) as usize;
        let end = (body_count as f64 * self.to as f64) as usize;
        first..=end.saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: &'static str,
    pub steps: Vec<Step>,
}

fn single(name: &'static str, recipe: GalaxyRecipe) -> Scenario {
    Scenario {
        name,
        steps: vec![Step::galaxy(0.0, 1.0, recipe)],
    }
}

fn pair(name: &'static str, left: GalaxyRecipe, right: GalaxyRecipe) -> Scenario {
    Scenario {
        name,
        steps: vec![
            Step::galaxy(0.0, 0.5, left.at(-0.15, 0.05, 0.0)),
            Step::galaxy(0.5, 1.0, right.at(0.15, 0.0, 0.0)),
        ],
    }
}

fn swarm(name: &'static str, count: usize, prescale: f32) -> Scenario {
    let share = 1.0 / count as f32;
    Scenario {
        name,
        steps: (0..count)
            .map(|i| {
                Step::galaxy(
                    i as f32 * share,
                    (i + 1) as f32 * share,
                    GalaxyRecipe::scattered(prescale),
                )
            })
            .collect(),
    }
}

/// The built-in models, in cycling order
pub fn catalog() -> Vec<Scenario> {
    let flat = GalaxyRecipe::flat();
    vec![
        single("flat galaxy", flat),
        single(
            "round galaxy",
            GalaxyRecipe { squeeze: Sample::Fixed(2.0), ..GalaxyRecipe::default() },
        ),
        Scenario {
            name: "small and big galaxy",
            steps: vec![
                Step::galaxy(0.0, 0.125, GalaxyRecipe { prescale: 0.125, ..flat.at(-0.15, 0.05, 0.0) }),
                Step { from: 0.125, to: 0.5, kind: StepKind::Clear },
                Step::galaxy(0.5, 1.0, flat.at(0.15, 0.0, 0.0).turned(0.0, FRAC_PI_2, 0.0)),
            ],
        },
        pair(
            "equal galaxies, parallel",
            flat.turned(0.0, FRAC_PI_2, FRAC_PI_2),
            GalaxyRecipe { squeeze: Sample::Fixed(1.0), ..flat.turned(0.0, FRAC_PI_2, FRAC_PI_2) },
        ),
        pair(
            "equal galaxies, opposite rotation",
            flat.turned(0.0, -FRAC_PI_2, 0.0),
            flat.turned(0.0, FRAC_PI_2, 0.0),
        ),
        pair("equal galaxies, same plane", flat, flat),
        pair(
            "equal galaxies, same plane, opposite rotation",
            flat.turned(0.0, 0.0, PI),
            flat,
        ),
        pair(
            "equal galaxies, different orientations",
            flat,
            flat.turned(0.0, FRAC_PI_2, 0.0),
        ),
        swarm("eight small galaxies", 8, 0.125),
        swarm("sixteen smaller galaxies", 16, 0.0625),
    ]
}
