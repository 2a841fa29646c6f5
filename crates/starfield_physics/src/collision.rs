//! Pairwise merging of close bodies from different populations.
//!
//! Every body evaluates the same rule against the same old state, so both members
//! of a merging pair reach the same combined position and velocity independently.
//! Only the survivor keeps the combined mass; the absorbed body becomes massless.

use starfield_core::{radius_for_mass, Body, Partitions};

/// Outcome of a merge, seen from one of the two bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub partner: usize,
    pub body: Body,
}

fn distance_sqr(a: [f32; 3], b: [f32; 3]) -> f32 {
    let d = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    d[0] * d[0] + d[1] * d[1] + d[2] * d[2]
}

/// Nearest massive body of a different partition closer than `distance`.
/// Ties go to the lower index.
pub fn nearest_contact(
    old: &[Body],
    i: usize,
    partitions: &Partitions,
    distance: f32,
) -> Option<usize> {
    let body = &old[i];
    if body.is_massless() || distance <= 0.0 {
        return None;
    }
    let own = partitions.of(i);
    let pos = body.pos();

    let mut best = None;
    let mut best_sqr = distance * distance;
    for (j, other) in old.iter().enumerate() {
        if j == i || other.is_massless() || partitions.of(j) == own {
            continue;
        }
        let d = distance_sqr(pos, other.pos());
        if d < best_sqr {
            best = Some(j);
            best_sqr = d;
        }
    }
    best
}

/// Mass-weighted combination of two bodies, keeping the radius proxy of neither
fn combine(a: &Body, b: &Body) -> Body {
    let (ma, mb) = (a.mass(), b.mass());
    let total = ma + mb;
    let mut merged = Body::ZERO;
    for k in 0..3 {
        merged.position[k] = (a.position[k] * ma + b.position[k] * mb) / total;
        merged.velocity[k] = (a.velocity[k] * ma + b.velocity[k] * mb) / total;
    }
    merged
}

/// Merge state of body `i`, if it and its nearest contact choose each other.
pub fn resolve(old: &[Body], i: usize, partitions: &Partitions, distance: f32) -> Option<Merge> {
    let partner = nearest_contact(old, i, partitions, distance)?;
    if nearest_contact(old, partner, partitions, distance) != Some(i) {
        return None;
    }

    // Fixed operand order so both bodies compute bit-identical results
    let (lo, hi) = (i.min(partner), i.max(partner));
    let (a, b) = (&old[lo], &old[hi]);
    let mut body = combine(a, b);

    let survivor = if b.mass() > a.mass() { hi } else { lo };
    body.position[3] = if i == survivor {
        radius_for_mass(a.mass() + b.mass())
    } else {
        0.0
    };
    Some(Merge { partner, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_at(first: u32) -> Partitions {
        let mut partitions = Partitions::default();
        partitions.push(0);
        partitions.push(first);
        partitions
    }

    #[test]
    fn test_mutual_pair_merges() {
        let old = [
            Body::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 1.0),
            Body::new([0.001, 0.0, 0.0], [-1.0, 0.0, 0.0], 1.0),
        ];
        let partitions = split_at(1);

        let a = resolve(&old, 0, &partitions, 0.002).unwrap();
        let b = resolve(&old, 1, &partitions, 0.002).unwrap();

        assert_eq!(a.partner, 1);
        assert_eq!(b.partner, 0);
        // Equal masses: lower index survives with the combined mass
        assert!((a.body.mass() - 2.0).abs() < 1e-5);
        assert!(b.body.is_massless());
        assert_eq!(a.body.pos(), b.body.pos());
        assert!((a.body.position[0] - 0.0005).abs() < 1e-7);
        assert!(a.body.velocity[0].abs() < 1e-6, "momentum should cancel");
    }

    #[test]
    fn test_heavier_body_survives() {
        let old = [
            Body::new([0.0, 0.0, 0.0], [0.0; 3], 1.0),
            Body::new([0.001, 0.0, 0.0], [0.0; 3], 2.0),
        ];
        let partitions = split_at(1);

        let light = resolve(&old, 0, &partitions, 0.002).unwrap();
        let heavy = resolve(&old, 1, &partitions, 0.002).unwrap();
        assert!(light.body.is_massless());
        assert!((heavy.body.mass() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_same_partition_never_merges() {
        let old = [
            Body::new([0.0, 0.0, 0.0], [0.0; 3], 1.0),
            Body::new([0.001, 0.0, 0.0], [0.0; 3], 1.0),
        ];
        assert_eq!(resolve(&old, 0, &Partitions::default(), 0.002), None);
    }

    #[test]
    fn test_out_of_range_never_merges() {
        let old = [
            Body::new([0.0, 0.0, 0.0], [0.0; 3], 1.0),
            Body::new([0.01, 0.0, 0.0], [0.0; 3], 1.0),
        ];
        assert_eq!(resolve(&old, 0, &split_at(1), 0.002), None);
    }

    #[test]
    fn test_massless_bodies_are_ignored() {
        let old = [
            Body::new([0.0, 0.0, 0.0], [0.0; 3], 1.0),
            Body::new([0.001, 0.0, 0.0], [0.0; 3], 0.0),
        ];
        assert_eq!(nearest_contact(&old, 0, &split_at(1), 0.002), None);
        assert_eq!(nearest_contact(&old, 1, &split_at(1), 0.002), None);
    }

    #[test]
    fn test_one_sided_contact_does_not_merge() {
        // Body 0 sees body 2, but body 2 prefers the closer body 1
        let old = [
            Body::new([0.0, 0.0, 0.0], [0.0; 3], 1.0),
            Body::new([0.0015, 0.0, 0.0], [0.0; 3], 1.0),
            Body::new([0.002, 0.0, 0.0], [0.0; 3], 1.0),
        ];
        let partitions = split_at(2);

        assert_eq!(nearest_contact(&old, 0, &partitions, 0.0025), Some(2));
        assert_eq!(nearest_contact(&old, 2, &partitions, 0.0025), Some(1));
        assert_eq!(resolve(&old, 0, &partitions, 0.0025), None);
        assert_eq!(resolve(&old, 1, &partitions, 0.0025).map(|m| m.partner), Some(2));
        assert_eq!(resolve(&old, 2, &partitions, 0.0025).map(|m| m.partner), Some(1));
    }
}
