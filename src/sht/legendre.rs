use std::f64::consts::PI;

const RESCALE: f64 = 1e150;

/// Normalised associated Legendre functions
/// `lambda_lm(theta) = Y_lm(theta, 0)`, Condon-Shortley phase included.
///
/// Values are produced by the three-term recursion in `l` at fixed `m`.
/// The recursion runs on a rescaled copy with the scale kept as a
/// logarithm, so `lambda_mm ~ sin^m(theta)` may be far below the smallest
/// `f64` while the later `lambda_lm` are of order one.
pub struct LegendreTable {
    lmax: usize,
    /// `ln |lambda_mm| - m ln sin(theta)`
    log_mm: Vec<f64>,
}

impl LegendreTable {
    pub fn new(lmax: usize) -> Self {
        let mut log_mm = Vec::with_capacity(lmax + 1);
        let mut log_prod = 0.0;
        for m in 0..=lmax {
            if m > 0 {
                log_prod += ((2 * m - 1) as f64 / (2 * m) as f64).ln();
            }
            log_mm.push(0.5 * (((2 * m + 1) as f64 / (4.0 * PI)).ln() + log_prod));
        }
        Self { lmax, log_mm }
    }

    pub fn lmax(&self) -> usize {
        self.lmax
    }

    /// Calls `f(l, lambda_lm, lambda_(l-1)m)` for `l = m..=lmax`.
    pub fn scan<F>(&self, m: usize, cth: f64, sth: f64, mut f: F)
    where
        F: FnMut(usize, f64, f64),
    {
        if m > self.lmax {
            return;
        }
        let mf = m as f64;
        let ln_rescale = RESCALE.ln();

        let mut log_scale = self.log_mm[m] + mf * sth.ln();
        let mut factor = log_scale.exp();
        let mut p_prev = 0.0;
        let mut p = if m % 2 == 0 { 1.0 } else { -1.0 };
        f(m, p * factor, 0.0);

        for l in m + 1..=self.lmax {
            let lf = l as f64;
            let a = ((4.0 * lf * lf - 1.0) / (lf * lf - mf * mf)).sqrt();
            let b = (((lf - 1.0).powi(2) - mf * mf) / (4.0 * (lf - 1.0).powi(2) - 1.0))
                .max(0.0)
                .sqrt();
            let next = a * (cth * p - b * p_prev);
            p_prev = p;
            p = next;
            if p.abs() > RESCALE {
                p /= RESCALE;
                p_prev /= RESCALE;
                log_scale += ln_rescale;
                factor = log_scale.exp();
            }
            f(l, p * factor, p_prev * factor);
        }
    }

    /// `lambda_lm` for `l = m..=lmax` at one colatitude.
    pub fn column(&self, m: usize, theta: f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.lmax + 1 - m.min(self.lmax));
        let (sth, cth) = theta.sin_cos();
        self.scan(m, cth, sth, |_, lam, _| out.push(lam));
        out
    }
}

/// Spin-2 kernels `(W_lm, X_lm)` such that
/// `Y^{+-2}_lm(theta, phi) = (W_lm +- X_lm) exp(i m phi)`, built from
/// `lambda_lm` and `lambda_(l-1)m`. Only defined for `l >= 2`.
pub fn spin2_wx(l: usize, m: usize, cth: f64, sth: f64, lam: f64, lam_prev: f64) -> (f64, f64) {
    let lf = l as f64;
    let mf = m as f64;
    let one_on_s2 = 1.0 / (sth * sth);
    let c_on_s2 = cth * one_on_s2;
    let lam_fact = ((2.0 * lf + 1.0) / (2.0 * lf - 1.0) * (lf * lf - mf * mf)).sqrt();
    let lam1 = lam_fact * lam_prev;
    let norm = 1.0 / ((lf - 1.0) * lf * (lf + 1.0) * (lf + 2.0)).sqrt();

    let a_w = 2.0 * (lf - mf * mf) * one_on_s2 + lf * (lf - 1.0);
    let w = -norm * (a_w * lam - 2.0 * c_on_s2 * lam1);
    let x = 2.0 * norm * mf * one_on_s2 * ((lf - 1.0) * cth * lam - lam1);
    (w, x)
}
