//! Masking of unobserved samples.
//!
//! The transforms treat [`UNSEEN`] pixels as absent from every quadrature
//! sum, while a NaN would propagate into every coefficient. Any non-finite
//! sample therefore has to be turned into the sentinel before analysis.

use crate::{
    constants::{UNSEEN, UNSEEN_RTOL},
    map::SphereMap,
};

pub fn is_unseen(x: f64) -> bool {
    (x - UNSEEN).abs() < UNSEEN_RTOL * UNSEEN.abs()
}

/// A sample that takes part in harmonic analysis.
pub fn is_observed(x: f64) -> bool {
    x.is_finite() && !is_unseen(x)
}

pub fn sanitize_slice(data: &[f64]) -> Vec<f64> {
    data.iter()
        .map(|&x| if x.is_finite() { x } else { UNSEEN })
        .collect()
}

/// Copy of `map` with every NaN/Inf replaced by [`UNSEEN`].
pub fn sanitize(map: &SphereMap) -> SphereMap {
    let data = sanitize_slice(map.as_slice());
    let nbad = data.iter().zip(map.iter()).filter(|(_, x)| !x.is_finite()).count();
    if nbad > 0 {
        log::debug!("masked {} non-finite samples out of {}", nbad, data.len());
    }
    map.with_samples(data)
}

pub fn observed_mask(data: &[f64]) -> Vec<bool> {
    data.iter().map(|&x| is_observed(x)).collect()
}

/// Unobserved samples set to zero, together with the observation mask.
pub(crate) fn zero_unobserved(data: &[f64]) -> (Vec<f64>, Vec<bool>) {
    let mask = observed_mask(data);
    let values = data
        .iter()
        .zip(mask.iter())
        .map(|(&x, &m)| if m { x } else { 0.0 })
        .collect();
    (values, mask)
}

/// Mean of the observed samples, `None` if nothing is observed.
pub fn observed_mean(map: &SphereMap) -> Option<f64> {
    let (sum, n) = map
        .iter()
        .filter(|&&x| is_observed(x))
        .fold((0.0, 0_usize), |(s, n), &x| (s + x, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

/// Subtract the mean of the observed pixels; unobserved pixels are left as
/// they are.
pub fn remove_monopole(map: &SphereMap) -> SphereMap {
    let mean = observed_mean(map).unwrap_or(0.0);
    let data = map
        .iter()
        .map(|&x| if is_observed(x) { x - mean } else { x })
        .collect();
    map.with_samples(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Ordering;
    use proptest::prelude::*;

    #[test]
    fn test_non_finite_become_unseen() {
        let mut data = vec![1.0; 48];
        data[0] = f64::NAN;
        data[5] = f64::INFINITY;
        data[7] = f64::NEG_INFINITY;
        data[9] = -2.5;
        let map = SphereMap::new(data, Ordering::Ring).unwrap();
        let clean = sanitize(&map);
        assert_eq!(clean.npix(), 48);
        assert_eq!(clean[0], UNSEEN);
        assert_eq!(clean[5], UNSEEN);
        assert_eq!(clean[7], UNSEEN);
        assert_eq!(clean[9], -2.5);
        assert_eq!(clean[1], 1.0);
        assert!(map[0].is_nan());
    }

    #[test]
    fn test_unseen_tolerance() {
        assert!(is_unseen(UNSEEN));
        assert!(is_unseen(UNSEEN * (1.0 + 1e-7)));
        assert!(!is_unseen(0.0));
        assert!(!is_observed(UNSEEN));
        assert!(!is_observed(f64::NAN));
        assert!(is_observed(1e30));
    }

    #[test]
    fn test_remove_monopole_skips_unseen() {
        let mut data = vec![3.0; 48];
        data[0] = UNSEEN;
        data[1] = 5.0;
        let map = SphereMap::new(data, Ordering::Nested).unwrap();
        let out = remove_monopole(&map);
        assert_eq!(out[0], UNSEEN);
        let mean = 3.0 + 2.0 / 47.0;
        assert!((out[1] - (5.0 - mean)).abs() < 1e-12);
        assert!((observed_mean(&out).unwrap()).abs() < 1e-12);
        assert_eq!(out.ordering(), Ordering::Nested);
    }

    #[test]
    fn test_zero_unobserved() {
        let (values, mask) = zero_unobserved(&[1.0, UNSEEN, f64::NAN, -1.0]);
        assert_eq!(values, vec![1.0, 0.0, 0.0, -1.0]);
        assert_eq!(mask, vec![true, false, false, true]);
    }

    fn sample() -> impl Strategy<Value = f64> {
        prop_oneof![
            any::<f64>(),
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
            -1e3..1e3f64,
        ]
    }

    proptest! {
        #[test]
        fn sanitize_preserves_length_and_finite_samples(data in prop::collection::vec(sample(), 48)) {
            let map = SphereMap::new(data.clone(), Ordering::Ring).unwrap();
            let clean = sanitize(&map);
            prop_assert_eq!(clean.npix(), data.len());
            for (&before, &after) in data.iter().zip(clean.iter()) {
                if before.is_finite() {
                    prop_assert_eq!(before.to_bits(), after.to_bits());
                } else {
                    prop_assert_eq!(after, UNSEEN);
                }
            }
        }
    }
}
