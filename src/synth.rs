//! Gaussian random skies for validation runs.

use num::complex::Complex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::{alm::Alm, eb::eb_to_qu, error::TransformError, map::SphereMap};

/// Draws coefficients with `<|a_lm|^2> = C_l`. Multipoles beyond `cl.len()`
/// are zero.
pub fn synalm<R: Rng>(cl: &[f64], lmax: usize, rng: &mut R) -> Alm {
    let mut alm = Alm::new(lmax, lmax);
    for m in 0..=lmax {
        for l in m..=lmax {
            let c = cl.get(l).copied().unwrap_or(0.0).max(0.0);
            let a = if m == 0 {
                Complex::new(rng.sample::<f64, _>(StandardNormal) * c.sqrt(), 0.0)
            } else {
                let sigma = (0.5 * c).sqrt();
                Complex::new(
                    rng.sample::<f64, _>(StandardNormal) * sigma,
                    rng.sample::<f64, _>(StandardNormal) * sigma,
                )
            };
            alm.set(l, m, a);
        }
    }
    alm
}

/// Q/U maps of a Gaussian sky with E and B spectra `cl_ee`, `cl_bb`.
/// Also returns the drawn coefficients.
pub fn synfast_pol(
    cl_ee: &[f64],
    cl_bb: &[f64],
    nside: usize,
    lmax: usize,
    seed: u64,
) -> Result<(SphereMap, SphereMap, Alm, Alm), TransformError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut alm_e = synalm(cl_ee, lmax, &mut rng);
    let mut alm_b = synalm(cl_bb, lmax, &mut rng);
    for (l, m) in [(0, 0), (1, 0), (1, 1)] {
        if l <= lmax {
            alm_e.set(l, m, Complex::new(0.0, 0.0));
            alm_b.set(l, m, Complex::new(0.0, 0.0));
        }
    }
    let (q, u) = eb_to_qu(&alm_e, &alm_b, nside)?;
    Ok((q, u, alm_e, alm_b))
}

/// `C_l = amplitude` for `2 <= l <= lmax`, zero below.
pub fn flat_spectrum(lmax: usize, amplitude: f64) -> Vec<f64> {
    (0..=lmax)
        .map(|l| if l < 2 { 0.0 } else { amplitude })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synalm_is_reproducible() {
        let cl = flat_spectrum(10, 1.0);
        let a = synalm(&cl, 10, &mut StdRng::seed_from_u64(7));
        let b = synalm(&cl, 10, &mut StdRng::seed_from_u64(7));
        let c = synalm(&cl, 10, &mut StdRng::seed_from_u64(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.get(0, 0), Complex::new(0.0, 0.0));
        assert!(a.iter().all(|(_, m, v)| m > 0 || v.im == 0.0));
    }

    #[test]
    fn test_synalm_power() {
        let lmax = 200;
        let cl = vec![4.0; lmax + 1];
        let alm = synalm(&cl, lmax, &mut StdRng::seed_from_u64(1));
        let measured = alm.cl();
        let mean: f64 = measured[100..].iter().sum::<f64>() / 101.0;
        assert!((mean - 4.0).abs() < 0.2, "mean C_l {mean}");
    }

    #[test]
    fn test_synfast_pure_b_has_no_e() {
        let (q, u, alm_e, alm_b) =
            synfast_pol(&[0.0; 9], &flat_spectrum(8, 1.0), 4, 8, 3).unwrap();
        assert_eq!(alm_e.max_abs(), 0.0);
        assert!(alm_b.max_abs() > 0.0);
        assert_eq!(q.nside(), 4);
        assert!(q.iter().chain(u.iter()).any(|&x| x != 0.0));
    }
}
