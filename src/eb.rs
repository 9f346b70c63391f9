//! Q/U to E/B decomposition.

use serde::{Deserialize, Serialize};

use crate::{
    alm::Alm,
    constants::DEFAULT_ITER,
    error::{MapError, TransformError},
    map::{Ordering, SphereMap},
    sanitize::sanitize,
    sht::ShtPlan,
};

pub use crate::sht::{default_lmax, max_lmax};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformParams {
    /// `None` selects [`default_lmax`]
    pub lmax: Option<usize>,
    pub iter: usize,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            lmax: None,
            iter: DEFAULT_ITER,
        }
    }
}

impl TransformParams {
    pub fn resolve_lmax(&self, nside: usize) -> Result<usize, TransformError> {
        if nside == 0 {
            return Err(MapError::InvalidNside { nside }.into());
        }
        let lmax = self.lmax.unwrap_or_else(|| default_lmax(nside));
        let max = max_lmax(nside);
        if lmax > max {
            Err(TransformError::LmaxTooLarge { lmax, max, nside })
        } else {
            Ok(lmax)
        }
    }
}

/// Result of [`qu_to_eb`]. Maps are RING ordered.
#[derive(Clone, Debug, PartialEq)]
pub struct EbPair {
    pub e_map: SphereMap,
    pub b_map: SphereMap,
    pub alm_e: Alm,
    pub alm_b: Alm,
}

impl EbPair {
    pub fn nside(&self) -> usize {
        self.e_map.nside()
    }

    pub fn lmax(&self) -> usize {
        self.alm_e.lmax()
    }
}

/// Decomposes the Stokes Q/U maps into E and B modes.
///
/// Non-finite samples are masked first. The E and B maps are the scalar
/// syntheses of the E and B coefficients at the input `nside`.
pub fn qu_to_eb(
    q: &SphereMap,
    u: &SphereMap,
    params: &TransformParams,
) -> Result<EbPair, TransformError> {
    if q.npix() != u.npix() {
        return Err(TransformError::Mismatch {
            q_npix: q.npix(),
            u_npix: u.npix(),
        });
    }
    let nside = q.nside();
    let lmax = params.resolve_lmax(nside)?;

    let q = sanitize(q).to_ordering(Ordering::Ring)?;
    let u = sanitize(u).to_ordering(Ordering::Ring)?;

    let plan = ShtPlan::new(nside, lmax)?;
    log::info!("alm (nside {}, lmax {}, iter {})", nside, lmax, params.iter);
    let (alm_e, alm_b) = plan.map2alm_spin(q.as_slice(), u.as_slice(), params.iter)?;

    log::info!("map");
    let e_map = SphereMap::new(plan.alm2map(&alm_e), Ordering::Ring)?;
    let b_map = SphereMap::new(plan.alm2map(&alm_b), Ordering::Ring)?;

    Ok(EbPair {
        e_map,
        b_map,
        alm_e,
        alm_b,
    })
}

/// Rebuilds RING-ordered Q/U maps from E/B coefficients.
pub fn eb_to_qu(
    alm_e: &Alm,
    alm_b: &Alm,
    nside: usize,
) -> Result<(SphereMap, SphereMap), TransformError> {
    let plan = ShtPlan::new(nside, alm_e.lmax())?;
    let (q, u) = plan.alm2map_spin(alm_e, alm_b)?;
    Ok((
        SphereMap::new(q, Ordering::Ring)?,
        SphereMap::new(u, Ordering::Ring)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lmax_resolution() {
        let params = TransformParams::default();
        assert_eq!(params.iter, 3);
        assert_eq!(params.resolve_lmax(4), Ok(11));
        let params = TransformParams {
            lmax: Some(6),
            iter: 0,
        };
        assert_eq!(params.resolve_lmax(4), Ok(6));
        let params = TransformParams {
            lmax: Some(12),
            iter: 0,
        };
        assert_eq!(
            params.resolve_lmax(4),
            Err(TransformError::LmaxTooLarge {
                lmax: 12,
                max: 11,
                nside: 4
            })
        );
    }

    #[test]
    fn test_zero_nside_is_an_error() {
        assert_eq!(default_lmax(0), 0);
        assert_eq!(
            TransformParams::default().resolve_lmax(0),
            Err(TransformError::Map(MapError::InvalidNside { nside: 0 }))
        );
        let alm = Alm::new(2, 2);
        assert_eq!(
            eb_to_qu(&alm, &alm, 0),
            Err(TransformError::Map(MapError::InvalidNside { nside: 0 }))
        );
    }

    #[test]
    fn test_mismatched_maps() {
        let q = SphereMap::zeros(2).unwrap();
        let u = SphereMap::zeros(4).unwrap();
        assert_eq!(
            qu_to_eb(&q, &u, &TransformParams::default()),
            Err(TransformError::Mismatch {
                q_npix: 48,
                u_npix: 192
            })
        );
    }

    #[test]
    fn test_nested_input_matches_ring_input() {
        let q = SphereMap::from_fn(4, |p| ((p * 37) % 11) as f64 - 5.0).unwrap();
        let u = SphereMap::from_fn(4, |p| ((p * 13) % 7) as f64 * 0.5).unwrap();
        let params = TransformParams {
            lmax: Some(8),
            iter: 1,
        };
        let ring = qu_to_eb(&q, &u, &params).unwrap();
        let nested = qu_to_eb(
            &q.to_ordering(Ordering::Nested).unwrap(),
            &u.to_ordering(Ordering::Nested).unwrap(),
            &params,
        )
        .unwrap();
        assert_eq!(ring, nested);
        assert_eq!(nested.e_map.ordering(), Ordering::Ring);
    }

    #[test]
    fn test_eb_to_qu_checks_shapes() {
        let e = Alm::new(8, 8);
        let b = Alm::new(8, 4);
        assert!(matches!(
            eb_to_qu(&e, &b, 4),
            Err(TransformError::AlmMismatch { .. })
        ));
        let b = Alm::new(8, 8);
        assert!(matches!(
            eb_to_qu(&e, &b, 2),
            Err(TransformError::LmaxTooLarge { .. })
        ));
        let (q, u) = eb_to_qu(&e, &b, 4).unwrap();
        assert!(q.iter().chain(u.iter()).all(|&x| x == 0.0));
    }
}
