use num::{complex::Complex, Zero};
use rayon::prelude::*;

use super::{masked_residual, RingGeometry, ShtPlan};
use crate::{alm::Alm, sanitize::zero_unobserved};

/// One quadrature pass: `a_lm = sum_rings lambda_lm(theta) F_m(ring)`.
pub(crate) fn analysis(plan: &ShtPlan, map: &[f64]) -> Alm {
    let lmax = plan.lmax();
    let geom = &plan.geom;
    let mut columns = Vec::with_capacity(lmax + 1);

    for ms in RingGeometry::m_blocks(lmax) {
        let start = ms.start;
        let fourier = geom.fourier(map, ms.clone());
        let block: Vec<_> = ms
            .into_par_iter()
            .map(|m| {
                let k = m - start;
                let mut col = vec![Complex::<f64>::zero(); lmax + 1 - m];
                for pair in geom.pairs() {
                    let fnorth = fourier[pair.north][k];
                    let (even, odd) = match pair.south {
                        Some(s) => (fnorth + fourier[s][k], fnorth - fourier[s][k]),
                        None => (fnorth, fnorth),
                    };
                    let ring = geom.ring(pair.north);
                    plan.table.scan(m, ring.z, ring.sin_theta, |l, lam, _| {
                        let f = if (l + m) % 2 == 0 { even } else { odd };
                        col[l - m] += f * lam;
                    });
                }
                col
            })
            .collect();
        columns.extend(block);
    }
    Alm::from_columns(lmax, columns)
}

pub(crate) fn synthesis(plan: &ShtPlan, alm: &Alm) -> Vec<f64> {
    let geom = &plan.geom;
    let lmax = alm.lmax().min(plan.lmax());
    let mmax = alm.mmax().min(lmax);

    let per_pair = geom
        .pairs()
        .par_iter()
        .map(|pair| {
            let ring = geom.ring(pair.north);
            let mut north = vec![Complex::<f64>::zero(); mmax + 1];
            let mut south = north.clone();
            for m in 0..=mmax {
                let col = alm.column(m);
                let mut even = Complex::<f64>::zero();
                let mut odd = Complex::<f64>::zero();
                plan.table.scan(m, ring.z, ring.sin_theta, |l, lam, _| {
                    if l > lmax {
                        return;
                    }
                    if (l + m) % 2 == 0 {
                        even += col[l - m] * lam;
                    } else {
                        odd += col[l - m] * lam;
                    }
                });
                north[m] = even + odd;
                south[m] = even - odd;
            }
            (
                geom.ring_samples(pair.north, &north),
                pair.south.map(|s| geom.ring_samples(s, &south)),
            )
        })
        .collect();
    geom.scatter(per_pair)
}

/// Scalar analysis with `iter` residual-correction passes.
/// Unobserved samples are left out of every quadrature sum.
pub(crate) fn map2alm_iter(plan: &ShtPlan, map: &[f64], iter: usize) -> Alm {
    let (values, mask) = zero_unobserved(map);
    let mut alm = analysis(plan, &values);
    for _ in 0..iter {
        let model = synthesis(plan, &alm);
        let residual = masked_residual(&values, &model, &mask);
        alm += &analysis(plan, &residual);
    }
    alm
}
