use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bevy::log::{debug, info, warn};
use bevy::math::{Mat4, Vec3};
use bevy::prelude::Resource;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use starfield_core::constants::{PAINT_STROKE, TRACK_SPEED};
use starfield_core::{Body, Partitions, SimConfig};
use starfield_physics::procgen;
use starfield_physics::{
    DirectKernel, ForceKernel, GalaxyScale, GalaxyShape, GalaxySummary, Placement, Tracking,
};

use crate::buffers::{Role, RoleTable, TripleBuffer};
use crate::dispatch::{ChunkJob, Completion, Gate};
use crate::error::EngineError;
use crate::params::{SimulationParameters, SweepSnapshot, TrackTarget};
use crate::scenario::{self, Scenario, StepKind};

/// Time-sliced all-pairs stepping engine.
///
/// Every `advance()` dispatches one chunk of the force kernel against the "old"
/// role, writing into "new". When the last chunk of a sweep lands the roles
/// rotate, so renderers always blend between two complete states: `Oldest`
/// and `Old`, weighted by [`Engine::interpolation_fraction`].
#[derive(Resource)]
pub struct Engine {
    config: SimConfig,
    kernel: Arc<dyn ForceKernel>,
    buffers: TripleBuffer,
    gate: Gate,
    params: SimulationParameters,
    snapshot: Arc<SweepSnapshot>,
    partitions: Arc<Partitions>,
    scenarios: Vec<Scenario>,
    /// Output storage handed back and forth with the dispatches
    scratch: Vec<Body>,
    /// First body of the next chunk
    cursor: usize,
    /// Final chunk dispatched, sweep not yet closed
    closing: bool,
    halted: bool,
    clock: f64,
    sweeps: u64,
    pass: u64,
    model: usize,
    paint_cursor: usize,
    sweep_started: Instant,
    rng: ChaCha8Rng,
}

impl Engine {
    pub fn new(config: SimConfig) -> Result<Self, EngineError> {
        Self::with_kernel(config, DirectKernel)
    }

    pub fn with_kernel(config: SimConfig, kernel: impl ForceKernel) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;

        let body_count = config.body_count as usize;
        let buffers = TripleBuffer::new(body_count, config.capacity())?;
        let gate = Gate::new(
            config.async_dispatch,
            Duration::from_millis(config.stall_timeout_ms),
        );

        info!(
            "Engine ready: {} bodies, chunk {}, capacity {}, {} dispatch",
            body_count,
            config.chunk_size,
            config.capacity(),
            if config.async_dispatch { "async" } else { "inline" }
        );

        Ok(Self {
            kernel: Arc::new(kernel),
            buffers,
            gate,
            params: SimulationParameters::default(),
            snapshot: Arc::new(SweepSnapshot::default()),
            partitions: Arc::new(Partitions::default()),
            scenarios: scenario::catalog(),
            scratch: Vec::with_capacity(config.chunk_size as usize),
            cursor: 0,
            closing: false,
            halted: false,
            clock: 0.0,
            sweeps: 0,
            pass: 0,
            model: 0,
            paint_cursor: 0,
            sweep_started: Instant::now(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        })
    }

    // --- Stepping ---

    /// Dispatch the next chunk. No-op while halted.
    pub fn advance(&mut self) -> Result<(), EngineError> {
        if self.halted {
            return Ok(());
        }
        self.settle()?;

        if self.cursor == 0 {
            self.begin_sweep();
        }

        let body_count = self.body_count();
        let end = (self.cursor + self.config.chunk_size as usize).min(body_count);
        let job = ChunkJob {
            old: self.buffers.share(Role::Old),
            range: self.cursor..end,
            snapshot: Arc::clone(&self.snapshot),
            partitions: Arc::clone(&self.partitions),
            scratch: std::mem::take(&mut self.scratch),
        };
        self.gate.dispatch(Arc::clone(&self.kernel), job);

        if end < body_count {
            self.cursor = end;
        } else {
            // Close the sweep now so a zero fraction always meets freshly rotated roles
            self.closing = true;
            self.settle()?;
        }
        Ok(())
    }

    /// Wait for the outstanding dispatch and land it
    fn settle(&mut self) -> Result<(), EngineError> {
        if let Some(done) = self.gate.acquire()? {
            self.land(done);
        }
        if self.closing {
            self.finish_sweep();
        }
        Ok(())
    }

    fn land(&mut self, done: Completion) {
        let Completion {
            range,
            bodies,
            elapsed,
        } = done;

        let elapsed_ms = elapsed.as_secs_f32() * 1000.0;
        if elapsed_ms > self.config.frame_budget_ms {
            warn!(
                "Chunk {:?} took {:.1} ms, over the {:.1} ms frame budget",
                range, elapsed_ms, self.config.frame_budget_ms
            );
        }

        self.buffers.get_mut(Role::New).bodies_mut()[range].copy_from_slice(&bodies);
        self.scratch = bodies;
    }

    /// Latch deferred edits into a fresh snapshot
    fn begin_sweep(&mut self) {
        let mut tracking = std::mem::take(&mut self.params.movement);
        let tracked = self.tracked_movement();
        tracking.accumulate(tracked.position, tracked.velocity);

        let kernel = self.params.kernel_params(&self.config, self.sweeps);
        self.snapshot = Arc::new(SweepSnapshot { kernel, tracking });
        self.sweep_started = Instant::now();
    }

    fn finish_sweep(&mut self) {
        self.closing = false;
        self.buffers.rotate();
        self.clock += self.snapshot.kernel.timestep as f64;
        self.sweeps += 1;
        self.pass += 1;
        self.cursor = 0;

        debug!(
            "Sweep {} complete: t = {:.6}, {:.1} ms",
            self.sweeps,
            self.clock,
            self.sweep_started.elapsed().as_secs_f32() * 1000.0
        );
    }

    /// Movement of the tracked body this sweep, read from the force input
    fn tracked_movement(&self) -> Tracking {
        let old = self.buffers.get(Role::Old).bodies();
        let primary = old[old.len() - 1];
        let secondary = match self.partitions.split() as usize {
            0 => primary,
            split => old[split - 1],
        };

        let (position, velocity) = match self.params.track {
            TrackTarget::None => return Tracking::default(),
            TrackTarget::Primary => (primary.position, primary.velocity),
            TrackTarget::Secondary => (secondary.position, secondary.velocity),
            TrackTarget::Barycenter => {
                let mut position = [0.0; 4];
                let mut velocity = [0.0; 4];
                for k in 0..3 {
                    position[k] = (primary.position[k] + secondary.position[k]) * 0.5;
                    velocity[k] = (primary.velocity[k] + secondary.velocity[k]) * 0.5;
                }
                (position, velocity)
            }
        };

        Tracking {
            position: [
                position[0] * TRACK_SPEED,
                position[1] * TRACK_SPEED,
                position[2] * TRACK_SPEED,
                0.0,
            ],
            velocity: [velocity[0], velocity[1], velocity[2], 0.0],
        }
    }

    /// Synchronisation point: returns once no dispatch is outstanding
    pub fn sync(&mut self) -> Result<(), EngineError> {
        self.settle()
    }

    /// Exclusive access for mutating the buffers, after the outstanding dispatch lands
    pub fn gate(&mut self) -> Result<GateGuard<'_>, EngineError> {
        self.settle()?;
        Ok(GateGuard { engine: self })
    }

    // --- Renderer interface ---

    /// Interpolation endpoint A
    pub fn stable_buffer_a(&self) -> &[Body] {
        self.buffers.get(Role::Oldest).bodies()
    }

    /// Interpolation endpoint B, also the force-evaluation input
    pub fn stable_buffer_b(&self) -> &[Body] {
        self.buffers.get(Role::Old).bodies()
    }

    /// Share of the current sweep already dispatched, in [0, (N-1)/N]
    pub fn interpolation_fraction(&self) -> f32 {
        self.cursor as f32 / self.body_count() as f32
    }

    pub fn interpolated_position(&self, index: usize) -> [f32; 3] {
        let a = self.stable_buffer_a()[index].pos();
        let b = self.stable_buffer_b()[index].pos();
        let t = self.interpolation_fraction();
        [
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
        ]
    }

    /// Blended positions with the radius proxy of endpoint B in w
    pub fn write_interpolated(&self, out: &mut Vec<[f32; 4]>) {
        let t = self.interpolation_fraction();
        out.clear();
        out.extend(
            self.stable_buffer_a()
                .iter()
                .zip(self.stable_buffer_b())
                .map(|(a, b)| {
                    [
                        a.position[0] + (b.position[0] - a.position[0]) * t,
                        a.position[1] + (b.position[1] - a.position[1]) * t,
                        a.position[2] + (b.position[2] - a.position[2]) * t,
                        b.position[3],
                    ]
                }),
        );
    }

    pub fn buffer(&self, role: Role) -> &[Body] {
        self.buffers.get(role).bodies()
    }

    /// Raw bytes of a role, padding included
    pub fn buffer_bytes(&self, role: Role) -> &[u8] {
        self.buffers.get(role).as_bytes()
    }

    pub fn roles(&self) -> RoleTable {
        self.buffers.roles()
    }

    // --- Seeding ---

    /// Re-seed every body from catalog model `model`, placed in front of `viewpoint`
    pub fn seed(&mut self, model: usize, viewpoint: Mat4) -> Result<(), EngineError> {
        let scenario = self
            .scenarios
            .get(model)
            .cloned()
            .ok_or(EngineError::UnknownModel(model))?;

        let body_count = self.body_count();
        for step in &scenario.steps {
            let range = step.range(body_count);
            if matches!(step.kind, StepKind::Galaxy(_)) && range.start() >= range.end() {
                return Err(EngineError::InvalidConfig(format!(
                    "'{}' needs more than {} bodies",
                    scenario.name, body_count
                )));
            }
        }

        let scale = GalaxyScale::from_config(&self.config);
        let mut gate = self.gate()?;
        gate.reset();
        for step in &scenario.steps {
            let range = step.range(body_count);
            match step.kind {
                StepKind::Galaxy(recipe) => {
                    let draw = recipe.draw(&mut gate.engine.rng);
                    let placement = Placement::in_front_of(
                        viewpoint,
                        draw.offset,
                        draw.velocity_offset,
                        draw.axis,
                        &scale,
                    );
                    gate.add_galaxy(range, &draw.shape, &placement);
                }
                StepKind::Clear => gate.clear_range(range),
            }
        }

        self.model = model;
        info!(
            "Seeded model {} '{}': {} partitions, split {}",
            model,
            scenario.name,
            self.partitions.count(),
            self.partitions.split()
        );
        Ok(())
    }

    pub fn next_model(&mut self, viewpoint: Mat4) -> Result<(), EngineError> {
        let next = (self.model + 1) % self.scenarios.len();
        self.seed(next, viewpoint)
    }

    pub fn previous_model(&mut self, viewpoint: Mat4) -> Result<(), EngineError> {
        let count = self.scenarios.len();
        let previous = (self.model + count - 1) % count;
        self.seed(previous, viewpoint)
    }

    /// Lay the next stroke of bodies on a line towards `target`. Only while halted.
    pub fn paint(&mut self, target: Vec3) -> Result<(), EngineError> {
        if !self.halted {
            debug!("Ignoring paint stroke while running");
            return Ok(());
        }

        let body_count = self.body_count();
        let first = self.paint_cursor;
        let last = (first + PAINT_STROKE).min(body_count) - 1;
        let mut gate = self.gate()?;
        let engine = &mut *gate.engine;

        let anchor_index = first.checked_sub(1).unwrap_or(body_count - 1);
        let anchor = Vec3::from_array(engine.buffers.get(Role::Old).bodies()[anchor_index].pos());
        procgen::paint_line(
            engine.buffers.get_mut(Role::Old).bodies_mut(),
            first..=last,
            anchor,
            target,
            &mut engine.rng,
        );
        engine.buffers.mirror(Role::Old, first..=last);
        engine.paint_cursor = if last + 1 >= body_count { 0 } else { last + 1 };
        Ok(())
    }

    // --- Parameters ---

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn resume(&mut self) {
        self.halted = false;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn set_speed(&mut self, percent: f32) {
        self.params.speed_percent = percent.max(0.0);
    }

    pub fn set_gravity(&mut self, percent: f32) {
        self.params.gravity_percent = percent;
    }

    pub fn set_collide(&mut self, collide: bool) {
        self.params.collide = collide;
    }

    pub fn set_squeeze(&mut self, squeeze: f32) {
        self.params.set_squeeze(squeeze);
    }

    /// Accumulate spectator movement, removed from every body when the next sweep begins
    pub fn move_spectator(&mut self, position: Vec3, velocity: Vec3) {
        self.params
            .movement
            .accumulate(position.extend(0.0).to_array(), velocity.extend(0.0).to_array());
    }

    pub fn set_track(&mut self, track: TrackTarget) {
        self.params.track = track;
    }

    pub fn cycle_track(&mut self) -> TrackTarget {
        self.params.track = self.params.track.next();
        self.params.track
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Parameters the running sweep was started with
    pub fn snapshot(&self) -> &SweepSnapshot {
        &self.snapshot
    }

    // --- Queries ---

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn body_count(&self) -> usize {
        self.config.body_count as usize
    }

    pub fn split_index(&self) -> u32 {
        self.partitions.split()
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.count()
    }

    pub fn partition_of(&self, index: usize) -> usize {
        self.partitions.of(index)
    }

    pub fn simulation_time(&self) -> f64 {
        self.clock
    }

    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    /// Sweeps since the last seed
    pub fn pass(&self) -> u64 {
        self.pass
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn model(&self) -> usize {
        self.model
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn is_dispatching(&self) -> bool {
        self.gate.is_busy()
    }
}

/// Proof that no dispatch is outstanding; buffer mutation goes through here
pub struct GateGuard<'a> {
    engine: &'a mut Engine,
}

impl GateGuard<'_> {
    /// Zero every role, restore the initial role binding and forget all partitions
    pub fn reset(&mut self) {
        let engine = &mut *self.engine;
        for role in Role::ALL {
            engine.buffers.get_mut(role).bodies_mut().fill(Body::ZERO);
        }
        engine.buffers.reset_roles();
        Arc::make_mut(&mut engine.partitions).clear();
        engine.cursor = 0;
        engine.pass = 0;
        engine.paint_cursor = 0;
    }

    /// Seed one galaxy into `range` of every role and make it the split.
    ///
    /// The galaxy becomes its own partition; bodies below the first seeded
    /// galaxy keep partition 0.
    pub fn add_galaxy(
        &mut self,
        range: RangeInclusive<usize>,
        shape: &GalaxyShape,
        placement: &Placement,
    ) -> GalaxySummary {
        let engine = &mut *self.engine;
        let first = *range.start();
        let scale = GalaxyScale::from_config(&engine.config);

        let summary = procgen::generate_galaxy(
            engine.buffers.get_mut(Role::Old).bodies_mut(),
            range.clone(),
            shape,
            &scale,
            placement,
            &mut engine.rng,
        );
        engine.buffers.mirror(Role::Old, range);

        Arc::make_mut(&mut engine.partitions).push(first as u32);
        engine.params.reset_for_seed(shape.collide);
        engine.cursor = 0;
        engine.pass = 0;
        summary
    }

    /// Zero `range` in every role
    pub fn clear_range(&mut self, range: RangeInclusive<usize>) {
        let engine = &mut *self.engine;
        procgen::clear_range(engine.buffers.get_mut(Role::Old).bodies_mut(), range.clone());
        engine.buffers.mirror(Role::Old, range);
        engine.cursor = 0;
    }

    pub fn bodies_mut(&mut self, role: Role) -> &mut [Body] {
        self.engine.buffers.get_mut(role).bodies_mut()
    }

    /// Copy `range` of `from` into the other roles
    pub fn mirror(&mut self, from: Role, range: RangeInclusive<usize>) {
        self.engine.buffers.mirror(from, range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimConfig {
        SimConfig {
            body_count: 16,
            chunk_size: 4,
            async_dispatch: false,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimConfig { chunk_size: 0, ..small_config() };
        assert!(matches!(Engine::new(config), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_model() {
        let mut engine = Engine::new(small_config()).unwrap();
        assert_eq!(
            engine.seed(10, Mat4::IDENTITY),
            Err(EngineError::UnknownModel(10))
        );
    }

    #[test]
    fn test_model_too_large_for_body_count() {
        let mut engine = Engine::new(small_config()).unwrap();
        assert!(matches!(
            engine.seed(9, Mat4::IDENTITY),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_model_cycling_wraps() {
        let config = SimConfig { body_count: 64, chunk_size: 16, ..small_config() };
        let mut engine = Engine::new(config).unwrap();
        engine.previous_model(Mat4::IDENTITY).unwrap();
        assert_eq!(engine.model(), 9);
        assert_eq!(engine.partition_count(), 16);
        engine.next_model(Mat4::IDENTITY).unwrap();
        assert_eq!(engine.model(), 0);
        assert_eq!(engine.partition_count(), 1);
    }

    #[test]
    fn test_gap_is_cleared() {
        let config = SimConfig { body_count: 64, chunk_size: 16, ..small_config() };
        let mut engine = Engine::new(config).unwrap();
        engine.seed(2, Mat4::IDENTITY).unwrap();

        for role in Role::ALL {
            assert!(engine.buffer(role)[8..32].iter().all(|b| *b == Body::ZERO));
        }
        assert_eq!(engine.split_index(), 32);
        assert_eq!(engine.partition_of(10), 0);
        assert_eq!(engine.partition_of(40), 1);
    }

    #[test]
    fn test_seed_resets_parameters() {
        let mut engine = Engine::new(small_config()).unwrap();
        engine.set_speed(10.0);
        engine.set_gravity(0.0);
        engine.set_squeeze(1.1);
        engine.set_track(TrackTarget::Primary);
        engine.seed(1, Mat4::IDENTITY).unwrap();

        let params = engine.params();
        assert_eq!(params.speed_percent, 100.0);
        assert_eq!(params.gravity_percent, 100.0);
        assert_eq!(params.squeeze, 1.0);
        assert_eq!(params.track, TrackTarget::None);
        assert_eq!(engine.pass(), 0);
    }

    #[test]
    fn test_edits_wait_for_sweep_boundary() {
        let mut engine = Engine::new(small_config()).unwrap();
        engine.seed(0, Mat4::IDENTITY).unwrap();
        engine.advance().unwrap();
        let timestep = engine.snapshot().kernel.timestep;

        engine.set_speed(50.0);
        engine.advance().unwrap();
        assert_eq!(engine.snapshot().kernel.timestep, timestep);

        engine.advance().unwrap();
        engine.advance().unwrap();
        assert_eq!(engine.cursor(), 0);
        engine.advance().unwrap();
        assert!((engine.snapshot().kernel.timestep - timestep * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_cycle_track() {
        let mut engine = Engine::new(small_config()).unwrap();
        assert_eq!(engine.cycle_track(), TrackTarget::Primary);
        assert_eq!(engine.cycle_track(), TrackTarget::Secondary);
        assert_eq!(engine.cycle_track(), TrackTarget::Barycenter);
        assert_eq!(engine.cycle_track(), TrackTarget::None);
    }

    #[test]
    fn test_paint_only_while_halted() {
        let mut engine = Engine::new(small_config()).unwrap();
        engine.paint(Vec3::ONE).unwrap();
        assert!(engine.buffer(Role::Old).iter().all(Body::is_massless));

        engine.halt();
        engine.paint(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let old = engine.buffer(Role::Old);
        assert!(old[..8].iter().all(|b| !b.is_massless()));
        assert!(old[8..].iter().all(Body::is_massless));
        assert!((old[7].position[0] - 1.0).abs() < 1e-6);
        assert_eq!(engine.buffer(Role::Oldest)[..8], old[..8]);
    }

    #[test]
    fn test_paint_cursor_wraps() {
        let mut engine = Engine::new(small_config()).unwrap();
        engine.halt();
        engine.paint(Vec3::X).unwrap();
        engine.paint(Vec3::Y).unwrap();
        // Third stroke wraps to the start and anchors on the last body
        engine.paint(Vec3::Z).unwrap();
        let old = engine.buffer(Role::Old);
        assert!((old[7].position[2] - 1.0).abs() < 1e-6);
        let anchor = Vec3::from_array(old[15].pos());
        let first = Vec3::from_array(old[0].pos());
        let expected = anchor.lerp(Vec3::Z, 1.0 / 8.0);
        assert!((first - expected).length() < 1e-5);
    }

    #[test]
    fn test_interpolated_output_matches_buffers() {
        let mut engine = Engine::new(small_config()).unwrap();
        engine.seed(1, Mat4::IDENTITY).unwrap();
        engine.advance().unwrap();
        engine.advance().unwrap();

        let mut out = Vec::new();
        engine.write_interpolated(&mut out);
        assert_eq!(out.len(), 16);
        let p = engine.interpolated_position(5);
        assert_eq!([out[5][0], out[5][1], out[5][2]], p);
        assert_eq!(out[15][3], engine.stable_buffer_b()[15].radius());
    }
}
