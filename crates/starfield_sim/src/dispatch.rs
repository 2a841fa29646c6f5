use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bevy::tasks::{block_on, poll_once, AsyncComputeTaskPool, Task, TaskPool};
use starfield_core::{Body, Partitions};
use starfield_physics::{ChunkInput, ForceKernel};

use crate::buffers::ParticleBuffer;
use crate::error::EngineError;
use crate::params::SweepSnapshot;

/// Pause between polls of an outstanding dispatch
const POLL_INTERVAL: Duration = Duration::from_micros(50);

/// Everything a dispatch owns while it runs
pub struct ChunkJob {
    pub old: Arc<ParticleBuffer>,
    pub range: Range<usize>,
    pub snapshot: Arc<SweepSnapshot>,
    pub partitions: Arc<Partitions>,
    /// Recycled output storage
    pub scratch: Vec<Body>,
}

/// Result of one dispatch, ready to be copied into the "new" role
pub struct Completion {
    pub range: Range<usize>,
    pub bodies: Vec<Body>,
    pub elapsed: Duration,
}

impl ChunkJob {
    pub fn run(self, kernel: &dyn ForceKernel) -> Completion {
        let ChunkJob {
            old,
            range,
            snapshot,
            partitions,
            mut scratch,
        } = self;

        let start = Instant::now();
        scratch.clear();
        scratch.resize(range.len(), Body::ZERO);
        kernel.compute_chunk(
            &ChunkInput {
                old: old.bodies(),
                range: range.clone(),
                params: &snapshot.kernel,
                tracking: &snapshot.tracking,
                partitions: &partitions,
            },
            &mut scratch,
        );
        let elapsed = start.elapsed();

        // Release the shared buffers before signalling, so the engine owns them again
        drop(old);
        drop(snapshot);
        drop(partitions);

        Completion {
            range,
            bodies: scratch,
            elapsed,
        }
    }
}

enum InFlight {
    /// Inline dispatch, finished before `dispatch` returned
    Ready(Completion),
    Pending(Task<Completion>),
}

/// Binary gate: at most one dispatch is outstanding at any time.
/// Taking the completion is the only way to release it.
pub struct Gate {
    in_flight: Option<InFlight>,
    async_dispatch: bool,
    stall_timeout: Duration,
}

impl Gate {
    pub fn new(async_dispatch: bool, stall_timeout: Duration) -> Self {
        Self {
            in_flight: None,
            async_dispatch,
            stall_timeout,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn dispatch(&mut self, kernel: Arc<dyn ForceKernel>, job: ChunkJob) {
        assert!(
            self.in_flight.is_none(),
            "dispatch of {:?} while another dispatch is outstanding",
            job.range
        );

        let flight = if self.async_dispatch {
            let pool = AsyncComputeTaskPool::get_or_init(TaskPool::new);
            InFlight::Pending(pool.spawn(async move { job.run(kernel.as_ref()) }))
        } else {
            InFlight::Ready(job.run(kernel.as_ref()))
        };
        self.in_flight = Some(flight);
    }

    /// Wait for the outstanding dispatch, if any.
    ///
    /// Gives up after the stall timeout; the dispatch stays outstanding and a
    /// later call resumes waiting for it.
    pub fn acquire(&mut self) -> Result<Option<Completion>, EngineError> {
        let Some(flight) = self.in_flight.take() else {
            return Ok(None);
        };

        match flight {
            InFlight::Ready(done) => Ok(Some(done)),
            InFlight::Pending(mut task) => {
                let start = Instant::now();
                loop {
                    if let Some(done) = block_on(poll_once(&mut task)) {
                        return Ok(Some(done));
                    }
                    let waited = start.elapsed();
                    if waited >= self.stall_timeout {
                        self.in_flight = Some(InFlight::Pending(task));
                        return Err(EngineError::Stalled { waited });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        }
    }
}
