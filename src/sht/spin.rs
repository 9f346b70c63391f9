use num::{complex::Complex, Zero};
use rayon::prelude::*;

use super::{legendre::spin2_wx, masked_residual, RingGeometry, ShtPlan};
use crate::{alm::Alm, sanitize::zero_unobserved};

/// One spin-2 quadrature pass over the Fourier coefficients of Q and U:
/// `aE = -sum (W Q_m + i X U_m)`, `aB = -sum (W U_m - i X Q_m)`.
pub(crate) fn analysis(plan: &ShtPlan, q: &[f64], u: &[f64]) -> (Alm, Alm) {
    let lmax = plan.lmax();
    let geom = &plan.geom;
    let i = Complex::<f64>::i();
    let mut e_cols = Vec::with_capacity(lmax + 1);
    let mut b_cols = Vec::with_capacity(lmax + 1);

    for ms in RingGeometry::m_blocks(lmax) {
        let start = ms.start;
        let fq = geom.fourier(q, ms.clone());
        let fu = geom.fourier(u, ms.clone());
        let (e_block, b_block): (Vec<_>, Vec<_>) = ms
            .into_par_iter()
            .map(|m| {
                let k = m - start;
                let mut e = vec![Complex::<f64>::zero(); lmax + 1 - m];
                let mut b = e.clone();
                for pair in geom.pairs() {
                    let (qn, un) = (fq[pair.north][k], fu[pair.north][k]);
                    let (q_plus, q_minus, u_plus, u_minus) = match pair.south {
                        Some(s) => (qn + fq[s][k], qn - fq[s][k], un + fu[s][k], un - fu[s][k]),
                        None => (qn, qn, un, un),
                    };
                    let ring = geom.ring(pair.north);
                    let (cth, sth) = (ring.z, ring.sin_theta);
                    plan.table.scan(m, cth, sth, |l, lam, lam_prev| {
                        if l < 2 {
                            return;
                        }
                        let (w, x) = spin2_wx(l, m, cth, sth, lam, lam_prev);
                        // W has the parity of lambda_lm across the equator, X the opposite one
                        let (qw, qx, uw, ux) = if (l + m) % 2 == 0 {
                            (q_plus, q_minus, u_plus, u_minus)
                        } else {
                            (q_minus, q_plus, u_minus, u_plus)
                        };
                        e[l - m] -= qw * w + i * ux * x;
                        b[l - m] -= uw * w - i * qx * x;
                    });
                }
                (e, b)
            })
            .unzip();
        e_cols.extend(e_block);
        b_cols.extend(b_block);
    }
    (Alm::from_columns(lmax, e_cols), Alm::from_columns(lmax, b_cols))
}

/// Q and U from E/B coefficients:
/// `Q_m = -sum_l (aE W + i aB X)`, `U_m = -sum_l (aB W - i aE X)`.
pub(crate) fn synthesis(plan: &ShtPlan, alm_e: &Alm, alm_b: &Alm) -> (Vec<f64>, Vec<f64>) {
    debug_assert!(alm_e.same_shape(alm_b));
    let geom = &plan.geom;
    let lmax = alm_e.lmax().min(plan.lmax());
    let mmax = alm_e.mmax().min(lmax);
    let i = Complex::<f64>::i();

    let (q_pairs, u_pairs): (Vec<_>, Vec<_>) = geom
        .pairs()
        .par_iter()
        .map(|pair| {
            let ring = geom.ring(pair.north);
            let (cth, sth) = (ring.z, ring.sin_theta);
            let zeros = vec![Complex::<f64>::zero(); mmax + 1];
            let (mut qn, mut qs, mut un, mut us) =
                (zeros.clone(), zeros.clone(), zeros.clone(), zeros);
            for m in 0..=mmax {
                let (ecol, bcol) = (alm_e.column(m), alm_b.column(m));
                plan.table.scan(m, cth, sth, |l, lam, lam_prev| {
                    if l < 2 || l > lmax {
                        return;
                    }
                    let (w, x) = spin2_wx(l, m, cth, sth, lam, lam_prev);
                    let (e, b) = (ecol[l - m], bcol[l - m]);
                    let s = if (l + m) % 2 == 0 { 1.0 } else { -1.0 };
                    let tqw = e * w;
                    let tqx = i * b * x;
                    let tuw = b * w;
                    let tux = -i * e * x;
                    qn[m] -= tqw + tqx;
                    qs[m] -= (tqw - tqx) * s;
                    un[m] -= tuw + tux;
                    us[m] -= (tuw - tux) * s;
                });
            }
            let q = (
                geom.ring_samples(pair.north, &qn),
                pair.south.map(|r| geom.ring_samples(r, &qs)),
            );
            let u = (
                geom.ring_samples(pair.north, &un),
                pair.south.map(|r| geom.ring_samples(r, &us)),
            );
            (q, u)
        })
        .unzip();
    (geom.scatter(q_pairs), geom.scatter(u_pairs))
}

/// Spin-2 analysis with `iter` residual-correction passes. Q and U are
/// masked independently.
pub(crate) fn map2alm_spin_iter(plan: &ShtPlan, q: &[f64], u: &[f64], iter: usize) -> (Alm, Alm) {
    let (q_values, q_mask) = zero_unobserved(q);
    let (u_values, u_mask) = zero_unobserved(u);
    let (mut alm_e, mut alm_b) = analysis(plan, &q_values, &u_values);
    for _ in 0..iter {
        let (q_model, u_model) = synthesis(plan, &alm_e, &alm_b);
        let q_res = masked_residual(&q_values, &q_model, &q_mask);
        let u_res = masked_residual(&u_values, &u_model, &u_mask);
        let (de, db) = analysis(plan, &q_res, &u_res);
        alm_e += &de;
        alm_b += &db;
    }
    (alm_e, alm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_pure_e_l2_m0_closed_form() {
        // aE_20 = 1 gives Q = -W_20 = -sqrt(15/32pi) sin^2(theta), U = 0
        let plan = ShtPlan::new(2, 4).unwrap();
        let mut alm_e = Alm::new(4, 4);
        let alm_b = Alm::new(4, 4);
        alm_e.set(2, 0, Complex::new(1.0, 0.0));
        let (q, u) = synthesis(&plan, &alm_e, &alm_b);
        for p in 0..48 {
            let z = crate::healpix::pix2vec_ring(2, p)[2];
            let expected = -(15.0 / (32.0 * PI)).sqrt() * (1.0 - z * z);
            assert!((q[p] - expected).abs() < 1e-12, "pixel {p}");
            assert!(u[p].abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_input_gives_zero() {
        let plan = ShtPlan::new(2, 5).unwrap();
        let zeros = vec![0.0; 48];
        let (e, b) = map2alm_spin_iter(&plan, &zeros, &zeros, 3);
        assert_eq!(e.max_abs(), 0.0);
        assert_eq!(b.max_abs(), 0.0);
        assert_eq!(e.lmax(), 5);
    }

    #[test]
    fn test_swapping_e_and_b_rotates_polarization() {
        // (Q, U) from pure B equals (-U, Q) from the same coefficients as pure E
        let plan = ShtPlan::new(4, 8).unwrap();
        let mut alm = Alm::new(8, 8);
        alm.set(3, 1, Complex::new(0.4, -0.2));
        alm.set(5, 4, Complex::new(-0.1, 0.7));
        let zero = Alm::new(8, 8);
        let (qe, ue) = synthesis(&plan, &alm, &zero);
        let (qb, ub) = synthesis(&plan, &zero, &alm);
        for p in 0..qe.len() {
            assert!((qb[p] + ue[p]).abs() < 1e-12);
            assert!((ub[p] - qe[p]).abs() < 1e-12);
        }
    }
}
