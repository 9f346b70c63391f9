//! Spherical-harmonic transforms on the HEALPix RING grid.
//!
//! Analysis is a direct quadrature with uniform pixel-area weights
//! `4 pi / npix`, optionally refined by Jacobi iterations
//! `alm <- alm + analysis(map - synthesis(alm))`. Unobserved pixels are
//! zero in every quadrature sum, including the residuals. Near a mask
//! this leaks power into the low multipoles; the bias is accepted as is.
//!
//! Spin-2 coefficients follow the E/B convention
//! `aE = -(a2 + a-2) / 2`, `aB = i (a2 - a-2) / 2`.

pub mod geometry;
pub mod legendre;
mod scalar;
mod spin;

use crate::{
    alm::Alm,
    error::{MapError, TransformError},
};

pub use geometry::{RingGeometry, RingPair, M_BLOCK};
pub use legendre::{spin2_wx, LegendreTable};

/// Conventional bandlimit `3 nside - 1`.
pub fn default_lmax(nside: usize) -> usize {
    (3 * nside).saturating_sub(1)
}

/// Largest `lmax` a plan accepts for `nside`.
///
/// Up to `3 nside - 1` the iterative refinement contracts and more passes
/// give a more accurate result. Above it the residual passes stop
/// converging and eventually diverge, so the bound coincides with
/// [`default_lmax`].
pub fn max_lmax(nside: usize) -> usize {
    default_lmax(nside)
}

/// Precomputed ring geometry, FFT plans and Legendre normalisation for one
/// `(nside, lmax)`. All transforms take RING-ordered samples.
pub struct ShtPlan {
    geom: RingGeometry,
    table: LegendreTable,
}

impl ShtPlan {
    /// Fails for `nside == 0` and for `lmax` above [`max_lmax`].
    pub fn new(nside: usize, lmax: usize) -> Result<Self, TransformError> {
        if nside == 0 {
            return Err(MapError::InvalidNside { nside }.into());
        }
        let max = max_lmax(nside);
        if lmax > max {
            return Err(TransformError::LmaxTooLarge { lmax, max, nside });
        }
        Ok(Self {
            geom: RingGeometry::new(nside),
            table: LegendreTable::new(lmax),
        })
    }

    pub fn nside(&self) -> usize {
        self.geom.nside()
    }

    pub fn npix(&self) -> usize {
        self.geom.npix()
    }

    pub fn lmax(&self) -> usize {
        self.table.lmax()
    }

    fn check_npix(&self, got: usize) -> Result<(), TransformError> {
        if got == self.npix() {
            Ok(())
        } else {
            Err(TransformError::PixelCount {
                expected: self.npix(),
                got,
            })
        }
    }

    pub fn map2alm(&self, map: &[f64], iter: usize) -> Result<Alm, TransformError> {
        self.check_npix(map.len())?;
        Ok(scalar::map2alm_iter(self, map, iter))
    }

    /// Coefficients above the plan's `lmax` are ignored.
    pub fn alm2map(&self, alm: &Alm) -> Vec<f64> {
        scalar::synthesis(self, alm)
    }

    pub fn map2alm_spin(
        &self,
        q: &[f64],
        u: &[f64],
        iter: usize,
    ) -> Result<(Alm, Alm), TransformError> {
        if q.len() != u.len() {
            return Err(TransformError::Mismatch {
                q_npix: q.len(),
                u_npix: u.len(),
            });
        }
        self.check_npix(q.len())?;
        Ok(spin::map2alm_spin_iter(self, q, u, iter))
    }

    pub fn alm2map_spin(
        &self,
        alm_e: &Alm,
        alm_b: &Alm,
    ) -> Result<(Vec<f64>, Vec<f64>), TransformError> {
        if !alm_e.same_shape(alm_b) {
            return Err(TransformError::AlmMismatch {
                e_lmax: alm_e.lmax(),
                e_mmax: alm_e.mmax(),
                b_lmax: alm_b.lmax(),
                b_mmax: alm_b.mmax(),
            });
        }
        Ok(spin::synthesis(self, alm_e, alm_b))
    }
}

pub fn map2alm(map: &[f64], nside: usize, lmax: usize, iter: usize) -> Result<Alm, TransformError> {
    ShtPlan::new(nside, lmax)?.map2alm(map, iter)
}

pub fn alm2map(alm: &Alm, nside: usize) -> Result<Vec<f64>, TransformError> {
    Ok(ShtPlan::new(nside, alm.lmax())?.alm2map(alm))
}

pub fn map2alm_spin(
    q: &[f64],
    u: &[f64],
    nside: usize,
    lmax: usize,
    iter: usize,
) -> Result<(Alm, Alm), TransformError> {
    ShtPlan::new(nside, lmax)?.map2alm_spin(q, u, iter)
}

pub fn alm2map_spin(
    alm_e: &Alm,
    alm_b: &Alm,
    nside: usize,
) -> Result<(Vec<f64>, Vec<f64>), TransformError> {
    ShtPlan::new(nside, alm_e.lmax())?.alm2map_spin(alm_e, alm_b)
}

/// `map - model` on observed pixels, zero elsewhere.
fn masked_residual(map: &[f64], model: &[f64], observed: &[bool]) -> Vec<f64> {
    map.iter()
        .zip(model.iter())
        .zip(observed.iter())
        .map(|((&x, &y), &obs)| if obs { x - y } else { 0.0 })
        .collect()
}
