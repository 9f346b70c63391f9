use std::{collections::HashMap, ops::Range, sync::Arc};

use num::{complex::Complex, Zero};

use rustfft::{Fft, FftDirection, FftPlanner};

/// FFT plans for the ring lengths of one pixelization, shared by all
/// worker threads.
pub struct RingFft {
    forward: HashMap<usize, Arc<dyn Fft<f64>>>,
    inverse: HashMap<usize, Arc<dyn Fft<f64>>>,
}

fn _plan(planner: &mut FftPlanner<f64>, len: usize, inverse: bool) -> Arc<dyn Fft<f64>> {
    planner.plan_fft(
        len,
        if inverse {
            FftDirection::Inverse
        } else {
            FftDirection::Forward
        },
    )
}

impl RingFft {
    pub fn new(lengths: impl IntoIterator<Item = usize>) -> Self {
        let mut planner = FftPlanner::new();
        let mut forward = HashMap::new();
        let mut inverse = HashMap::new();
        for len in lengths {
            forward
                .entry(len)
                .or_insert_with(|| _plan(&mut planner, len, false));
            inverse
                .entry(len)
                .or_insert_with(|| _plan(&mut planner, len, true));
        }
        Self { forward, inverse }
    }

    fn plan(&self, len: usize, inverse: bool) -> Arc<dyn Fft<f64>> {
        let plans = if inverse { &self.inverse } else { &self.forward };
        match plans.get(&len) {
            Some(p) => Arc::clone(p),
            None => _plan(&mut FftPlanner::new(), len, inverse),
        }
    }

    /// `weight * sum_j f_j exp(-i m phi_j)` for every `m` in `ms`, where
    /// `phi_j = phi0 + 2 pi j / n` are the azimuths of the ring pixels.
    pub fn analyze_ring(
        &self,
        values: &[f64],
        phi0: f64,
        ms: Range<usize>,
        weight: f64,
    ) -> Vec<Complex<f64>> {
        let nphi = values.len();
        let mut buf: Vec<_> = values
            .iter()
            .map(|&x| Complex::new(x * weight, 0.0))
            .collect();
        self.plan(nphi, false).process(&mut buf);
        ms.map(|m| buf[m % nphi] * Complex::from_polar(1.0, -(m as f64) * phi0))
            .collect()
    }

    /// Real ring samples `f_j = sum_m F_m exp(i m phi_j)` over
    /// `m = -mmax..=mmax`, with `F_-m = conj(F_m)` and `coeffs[m] = F_m`.
    pub fn synthesize_ring(&self, coeffs: &[Complex<f64>], phi0: f64, nphi: usize) -> Vec<f64> {
        let mut buf = vec![Complex::<f64>::zero(); nphi];
        for (m, &c) in coeffs.iter().enumerate() {
            let v = c * Complex::from_polar(1.0, m as f64 * phi0);
            buf[m % nphi] += v;
            if m > 0 {
                buf[(nphi - m % nphi) % nphi] += v.conj();
            }
        }
        self.plan(nphi, true).process(&mut buf);
        buf.iter().map(|c| c.re).collect()
    }
}
