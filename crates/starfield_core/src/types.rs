use bytemuck::{Pod, Zeroable};

/// GPU-compatible body representation
/// Must be repr(C) and Pod so buffers can be uploaded to a renderer as raw bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Body {
    /// Position (x, y, z) + radius proxy packed in w
    pub position: [f32; 4],
    /// Velocity (x, y, z); w only takes part in transform math
    pub velocity: [f32; 4],
}

impl Body {
    pub const ZERO: Body = Body {
        position: [0.0; 4],
        velocity: [0.0; 4],
    };

    pub fn new(pos: [f32; 3], vel: [f32; 3], radius: f32) -> Self {
        Self {
            position: [pos[0], pos[1], pos[2], radius],
            velocity: [vel[0], vel[1], vel[2], 0.0],
        }
    }

    /// Radius proxy, the cube root of the body's mass
    pub fn radius(&self) -> f32 {
        self.position[3]
    }

    /// Mass is never stored; it follows from the radius proxy as radius³
    pub fn mass(&self) -> f32 {
        let r = self.position[3];
        r * r * r
    }

    pub fn pos(&self) -> [f32; 3] {
        [self.position[0], self.position[1], self.position[2]]
    }

    pub fn vel(&self) -> [f32; 3] {
        [self.velocity[0], self.velocity[1], self.velocity[2]]
    }

    pub fn is_massless(&self) -> bool {
        self.position[3] == 0.0
    }
}

/// Radius proxy for a given mass
pub fn radius_for_mass(mass: f32) -> f32 {
    mass.cbrt()
}

/// Partition boundaries of the co-resident populations in a buffer.
///
/// Every generated galaxy registers its first index. A body belongs to the
/// partition whose start is the greatest start not above its index. Index 0
/// always starts a partition, so bodies below the first generated population
/// form their own partition 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partitions {
    /// Sorted, deduplicated partition starts
    starts: Vec<u32>,
    /// First index of the most recently generated population
    split: u32,
}

impl Partitions {
    pub fn clear(&mut self) {
        self.starts.clear();
        self.split = 0;
    }

    /// Register a population starting at `first` and make it the split
    pub fn push(&mut self, first: u32) {
        if self.starts.is_empty() && first != 0 {
            self.starts.push(0);
        }
        let at = self.starts.partition_point(|&s| s < first);
        if self.starts.get(at) != Some(&first) {
            self.starts.insert(at, first);
        }
        self.split = first;
    }

    /// Split index: the first body of the most recently generated population
    pub fn split(&self) -> u32 {
        self.split
    }

    pub fn count(&self) -> usize {
        self.starts.len().max(1)
    }

    /// Partition containing body `index`
    pub fn of(&self, index: usize) -> usize {
        self.starts
            .partition_point(|&s| s as usize <= index)
            .saturating_sub(1)
    }

    pub fn same(&self, a: usize, b: usize) -> bool {
        self.of(a) == self.of(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_is_radius_cubed() {
        let body = Body::new([0.0; 3], [0.0; 3], 2.0);
        assert_eq!(body.mass(), 8.0);
        assert!((radius_for_mass(body.mass()) - 2.0).abs() < 1e-6);
        assert!(Body::ZERO.is_massless());
    }

    #[test]
    fn test_body_layout_is_two_vec4() {
        assert_eq!(std::mem::size_of::<Body>(), 32);
        let bodies = [Body::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], 1.5)];
        let floats: &[f32] = bytemuck::cast_slice(&bodies);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 1.5, 4.0, 5.0, 6.0, 0.0]);
    }

    #[test]
    fn test_partition_lookup() {
        let mut partitions = Partitions::default();
        assert_eq!(partitions.count(), 1);
        assert_eq!(partitions.of(10), 0);

        partitions.push(0);
        partitions.push(8);
        partitions.push(4);
        assert_eq!(partitions.split(), 4);
        assert_eq!(partitions.count(), 3);
        assert_eq!(partitions.of(0), 0);
        assert_eq!(partitions.of(3), 0);
        assert_eq!(partitions.of(4), 1);
        assert_eq!(partitions.of(7), 1);
        assert_eq!(partitions.of(8), 2);
        assert_eq!(partitions.of(1000), 2);
        assert!(partitions.same(5, 6));
        assert!(!partitions.same(3, 4));
    }

    #[test]
    fn test_partition_push_is_idempotent() {
        let mut partitions = Partitions::default();
        partitions.push(0);
        partitions.push(0);
        assert_eq!(partitions.count(), 1);
        partitions.push(8);
        assert_eq!(partitions.count(), 2);

        partitions.clear();
        assert_eq!(partitions.split(), 0);
        assert_eq!(partitions.count(), 1);
    }

    #[test]
    fn test_bodies_below_first_population_stay_apart() {
        let mut partitions = Partitions::default();
        partitions.push(16);
        partitions.push(16);
        assert_eq!(partitions.split(), 16);
        assert_eq!(partitions.count(), 2);
        assert_eq!(partitions.of(3), 0);
        assert_eq!(partitions.of(16), 1);
        assert!(!partitions.same(15, 16));
    }
}
