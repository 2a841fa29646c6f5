use std::ops::RangeInclusive;
use std::sync::Arc;

use starfield_core::Body;

use crate::error::EngineError;

/// Fixed-capacity body storage, padded to a whole number of chunks.
/// Padding slots stay zero-mass and are never handed to the kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleBuffer {
    bodies: Vec<Body>,
    body_count: usize,
}

impl ParticleBuffer {
    pub fn new(body_count: usize, capacity: usize) -> Result<Self, EngineError> {
        assert!(body_count <= capacity, "{body_count} bodies do not fit {capacity} slots");
        let mut bodies = Vec::new();
        bodies
            .try_reserve_exact(capacity)
            .map_err(|_| EngineError::AllocationFailed { bodies: capacity })?;
        bodies.resize(capacity, Body::ZERO);
        Ok(Self { bodies, body_count })
    }

    /// The live bodies, padding excluded
    pub fn bodies(&self) -> &[Body] {
        &self.bodies[..self.body_count]
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies[..self.body_count]
    }

    pub fn body_count(&self) -> usize {
        self.body_count
    }

    pub fn capacity(&self) -> usize {
        self.bodies.len()
    }

    /// Raw view of every slot, padding included, for upload to a renderer
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bodies)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Interpolation endpoint A
    Oldest,
    /// Force-evaluation input and interpolation endpoint B
    Old,
    /// Being written by the current sweep
    New,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Oldest, Role::Old, Role::New];
}

/// Which physical buffer backs each role. Always a permutation of {0, 1, 2}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTable {
    oldest: usize,
    old: usize,
    new: usize,
}

impl Default for RoleTable {
    fn default() -> Self {
        Self { oldest: 2, old: 0, new: 1 }
    }
}

impl RoleTable {
    pub fn slot(&self, role: Role) -> usize {
        match role {
            Role::Oldest => self.oldest,
            Role::Old => self.old,
            Role::New => self.new,
        }
    }

    /// (oldest, old, new) ← (old, new, oldest)
    pub fn rotate(&mut self) {
        (self.oldest, self.old, self.new) = (self.old, self.new, self.oldest);
    }
}

/// The three physical buffers behind the roles.
///
/// Slots are reference counted so an in-flight dispatch can read `Old` while
/// the engine keeps serving `Oldest` and `Old` to the renderer.
pub struct TripleBuffer {
    slots: [Arc<ParticleBuffer>; 3],
    roles: RoleTable,
}

impl TripleBuffer {
    pub fn new(body_count: usize, capacity: usize) -> Result<Self, EngineError> {
        Ok(Self {
            slots: [
                Arc::new(ParticleBuffer::new(body_count, capacity)?),
                Arc::new(ParticleBuffer::new(body_count, capacity)?),
                Arc::new(ParticleBuffer::new(body_count, capacity)?),
            ],
            roles: RoleTable::default(),
        })
    }

    pub fn get(&self, role: Role) -> &ParticleBuffer {
        &self.slots[self.roles.slot(role)]
    }

    /// Mutable access; clones the buffer only if a dispatch still shares it
    pub fn get_mut(&mut self, role: Role) -> &mut ParticleBuffer {
        Arc::make_mut(&mut self.slots[self.roles.slot(role)])
    }

    /// Shared handle for a dispatch
    pub fn share(&self, role: Role) -> Arc<ParticleBuffer> {
        Arc::clone(&self.slots[self.roles.slot(role)])
    }

    pub fn roles(&self) -> RoleTable {
        self.roles
    }

    pub fn rotate(&mut self) {
        self.roles.rotate();
    }

    pub fn reset_roles(&mut self) {
        self.roles = RoleTable::default();
    }

    /// Copy `range` of `from` into the other two roles
    pub fn mirror(&mut self, from: Role, range: RangeInclusive<usize>) {
        let source: Vec<Body> = self.get(from).bodies()[range.clone()].to_vec();
        for role in Role::ALL.into_iter().filter(|&r| r != from) {
            self.get_mut(role).bodies_mut()[range.clone()].copy_from_slice(&source);
        }
    }
}
