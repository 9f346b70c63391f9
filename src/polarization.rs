//! Per-pixel polarization quantities.

use std::f64::consts::FRAC_PI_2;

use crate::{
    constants::UNSEEN, error::MapError, map::SphereMap, sanitize::is_observed,
};

fn combine(
    q: &SphereMap,
    u: &SphereMap,
    f: impl Fn(f64, f64) -> f64,
) -> Result<SphereMap, MapError> {
    if !q.same_grid(u) {
        return Err(MapError::NotCoRegistered {
            left: q.describe(),
            right: u.describe(),
        });
    }
    let data = q
        .iter()
        .zip(u.iter())
        .map(|(&q, &u)| {
            if is_observed(q) && is_observed(u) {
                f(q, u)
            } else {
                UNSEEN
            }
        })
        .collect();
    Ok(q.with_samples(data))
}

/// `P = sqrt(Q^2 + U^2)`.
pub fn polarized_intensity(q: &SphereMap, u: &SphereMap) -> Result<SphereMap, MapError> {
    combine(q, u, f64::hypot)
}

/// Polarization angle `psi = atan2(U, Q) / 2` in radians.
pub fn polarization_angle(q: &SphereMap, u: &SphereMap) -> Result<SphereMap, MapError> {
    combine(q, u, |q, u| 0.5 * u.atan2(q))
}

/// Plane-of-sky magnetic field angle, `psi + pi/2`.
pub fn magnetic_field_angle(q: &SphereMap, u: &SphereMap) -> Result<SphereMap, MapError> {
    combine(q, u, |q, u| 0.5 * u.atan2(q) + FRAC_PI_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Ordering;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_angles_and_intensity() {
        let mut q = vec![0.0; 48];
        let mut u = vec![0.0; 48];
        q[0] = 3.0;
        u[0] = 4.0;
        q[1] = 0.0;
        u[1] = 1.0;
        q[2] = f64::NAN;
        u[3] = UNSEEN;
        let q = SphereMap::new(q, Ordering::Ring).unwrap();
        let u = SphereMap::new(u, Ordering::Ring).unwrap();

        let p = polarized_intensity(&q, &u).unwrap();
        assert_eq!(p[0], 5.0);
        assert_eq!(p[2], UNSEEN);
        assert_eq!(p[3], UNSEEN);

        let psi = polarization_angle(&q, &u).unwrap();
        assert!((psi[1] - FRAC_PI_4).abs() < 1e-15);
        let chi = magnetic_field_angle(&q, &u).unwrap();
        assert!((chi[1] - 3.0 * FRAC_PI_4).abs() < 1e-15);
        assert_eq!(chi[3], UNSEEN);
    }

    #[test]
    fn test_grids_must_match() {
        let q = SphereMap::zeros(1).unwrap();
        let u = SphereMap::zeros(2).unwrap();
        assert!(matches!(
            polarized_intensity(&q, &u),
            Err(MapError::NotCoRegistered { .. })
        ));
    }
}
