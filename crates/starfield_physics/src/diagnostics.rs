use starfield_core::Body;

/// Total mass of the system (sum of radius³)
pub fn total_mass(bodies: &[Body]) -> f64 {
    bodies.iter().map(|b| b.mass() as f64).sum()
}

/// Linear momentum of the system
pub fn momentum(bodies: &[Body]) -> [f64; 3] {
    let mut p = [0.0f64; 3];
    for body in bodies.iter().filter(|b| !b.is_massless()) {
        let m = body.mass() as f64;
        for k in 0..3 {
            p[k] += m * body.velocity[k] as f64;
        }
    }
    p
}

/// Total kinetic energy of the system
pub fn kinetic_energy(bodies: &[Body]) -> f64 {
    bodies
        .iter()
        .filter(|b| !b.is_massless())
        .map(|b| {
            let v = b.vel();
            let v2 = v[0] * v[0] + v[1] * v[1] + v[2] * v[2];
            0.5 * b.mass() as f64 * v2 as f64
        })
        .sum()
}

/// Mass-weighted center of the system, the origin when everything is massless
pub fn center_of_mass(bodies: &[Body]) -> [f64; 3] {
    let mass = total_mass(bodies);
    if mass == 0.0 {
        return [0.0; 3];
    }

    let mut c = [0.0f64; 3];
    for body in bodies {
        let m = body.mass() as f64;
        for k in 0..3 {
            c[k] += m * body.position[k] as f64;
        }
    }
    c.map(|x| x / mass)
}

/// Largest distance of a massive body from `center`
pub fn extent(bodies: &[Body], center: [f64; 3]) -> f64 {
    bodies
        .iter()
        .filter(|b| !b.is_massless())
        .map(|b| {
            let d = [
                b.position[0] as f64 - center[0],
                b.position[1] as f64 - center[1],
                b.position[2] as f64 - center[2],
            ];
            (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> [Body; 3] {
        [
            Body::new([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], 1.0),
            Body::new([3.0, 0.0, 0.0], [0.0, -1.0, 0.0], 1.0),
            Body::new([100.0, 0.0, 0.0], [50.0, 0.0, 0.0], 0.0),
        ]
    }

    #[test]
    fn test_totals() {
        let bodies = pair();
        assert!((total_mass(&bodies) - 2.0).abs() < 1e-9);
        assert!((kinetic_energy(&bodies) - 1.0).abs() < 1e-9);
        let p = momentum(&bodies);
        assert!(p.iter().all(|x| x.abs() < 1e-9), "momentum should cancel: {p:?}");
    }

    #[test]
    fn test_center_ignores_massless() {
        let bodies = pair();
        let c = center_of_mass(&bodies);
        assert!((c[0] - 1.0).abs() < 1e-9);
        assert!((extent(&bodies, c) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_system() {
        assert_eq!(total_mass(&[]), 0.0);
        assert_eq!(center_of_mass(&[Body::ZERO]), [0.0; 3]);
        assert_eq!(extent(&[], [0.0; 3]), 0.0);
    }
}
