use starfield_core::constants::G;

/// Acceleration that a mass `mass_j` at `pos_j` induces on a body at `pos_i`.
///
/// Plummer softening: `G m d / (|d|² + ε²)^(3/2)`, so coincident bodies
/// contribute nothing instead of a singularity.
pub fn gravity_acceleration(
    pos_i: [f32; 3],
    pos_j: [f32; 3],
    mass_j: f32,
    softening_sqr: f32,
) -> [f32; 3] {
    let d = [pos_j[0] - pos_i[0], pos_j[1] - pos_i[1], pos_j[2] - pos_i[2]];
    let dist_sqr = d[0] * d[0] + d[1] * d[1] + d[2] * d[2] + softening_sqr;
    let inv_dist = dist_sqr.sqrt().recip();
    let scale = G * mass_j * inv_dist * inv_dist * inv_dist;
    d.map(|c| c * scale)
}

/// Anisotropic rescale that keeps the seeded bar/spiral structure alive:
/// x is stretched by `squeeze`, y compressed by it, z untouched
pub fn squeeze_acceleration(acc: [f32; 3], squeeze: f32) -> [f32; 3] {
    [acc[0] * squeeze, acc[1] / squeeze, acc[2]]
}
