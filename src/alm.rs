use std::ops::{AddAssign, Index, IndexMut};

use num::{complex::Complex, Zero};

/// Spherical-harmonic coefficients `a_lm` for `0 <= m <= min(l, mmax)`,
/// `l <= lmax`, stored m-major: all `l` of `m = 0`, then `m = 1`, ...
#[derive(Clone, Debug, PartialEq)]
pub struct Alm {
    lmax: usize,
    mmax: usize,
    data: Vec<Complex<f64>>,
}

pub fn alm_size(lmax: usize, mmax: usize) -> usize {
    (mmax + 1) * (2 * lmax + 2 - mmax) / 2
}

impl Alm {
    pub fn new(lmax: usize, mmax: usize) -> Self {
        let mmax = mmax.min(lmax);
        Self {
            lmax,
            mmax,
            data: vec![Complex::zero(); alm_size(lmax, mmax)],
        }
    }

    /// `None` if `data.len()` does not match the triangular size.
    pub fn from_vec(lmax: usize, mmax: usize, data: Vec<Complex<f64>>) -> Option<Self> {
        if mmax > lmax || data.len() != alm_size(lmax, mmax) {
            None
        } else {
            Some(Self { lmax, mmax, data })
        }
    }

    /// Builds the set from per-`m` columns, column `m` holding `l = m..=lmax`.
    pub(crate) fn from_columns(lmax: usize, columns: Vec<Vec<Complex<f64>>>) -> Self {
        let mmax = columns.len() - 1;
        let data: Vec<_> = columns.into_iter().flatten().collect();
        debug_assert_eq!(data.len(), alm_size(lmax, mmax));
        Self { lmax, mmax, data }
    }

    pub fn lmax(&self) -> usize {
        self.lmax
    }

    pub fn mmax(&self) -> usize {
        self.mmax
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn same_shape(&self, other: &Alm) -> bool {
        self.lmax == other.lmax && self.mmax == other.mmax
    }

    /// Packed position of `(l, m)`.
    ///
    /// # Panics
    ///
    /// If `(l, m)` lies outside the triangle.
    pub fn index(&self, l: usize, m: usize) -> usize {
        assert!(
            m <= l && l <= self.lmax && m <= self.mmax,
            "({}, {}) outside lmax {} mmax {}",
            l,
            m,
            self.lmax,
            self.mmax
        );
        m * (2 * self.lmax + 1 - m) / 2 + l
    }

    pub fn get(&self, l: usize, m: usize) -> Complex<f64> {
        self.data[self.index(l, m)]
    }

    pub fn set(&mut self, l: usize, m: usize, value: Complex<f64>) {
        let i = self.index(l, m);
        self.data[i] = value;
    }

    pub fn get_mut(&mut self, l: usize, m: usize) -> &mut Complex<f64> {
        let i = self.index(l, m);
        &mut self.data[i]
    }

    pub fn as_slice(&self) -> &[Complex<f64>] {
        &self.data
    }

    /// Coefficients of order `m`, `l = m..=lmax`.
    pub fn column(&self, m: usize) -> &[Complex<f64>] {
        let start = self.index(m, m);
        &self.data[start..start + self.lmax + 1 - m]
    }

    /// `(l, m, a_lm)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Complex<f64>)> + '_ {
        (0..=self.mmax)
            .flat_map(move |m| (m..=self.lmax).map(move |l| (l, m)))
            .zip(self.data.iter())
            .map(|((l, m), &a)| (l, m, a))
    }

    /// Angular power spectrum `C_l`, `l = 0..=lmax`.
    pub fn cl(&self) -> Vec<f64> {
        let mut cl = vec![0.0; self.lmax + 1];
        for (l, m, a) in self.iter() {
            cl[l] += if m == 0 { a.norm_sqr() } else { 2.0 * a.norm_sqr() };
        }
        cl.iter_mut()
            .enumerate()
            .for_each(|(l, c)| *c /= (2 * l + 1) as f64);
        cl
    }

    /// Total power `sum_l (2l+1) C_l`, i.e. the squared L2 norm of the field
    /// over the sphere.
    pub fn energy(&self) -> f64 {
        self.cl()
            .iter()
            .enumerate()
            .map(|(l, c)| (2 * l + 1) as f64 * c)
            .sum()
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().map(|a| a.norm()).fold(0.0, f64::max)
    }
}

impl Index<(usize, usize)> for Alm {
    type Output = Complex<f64>;

    fn index(&self, (l, m): (usize, usize)) -> &Complex<f64> {
        &self.data[Alm::index(self, l, m)]
    }
}

impl IndexMut<(usize, usize)> for Alm {
    fn index_mut(&mut self, (l, m): (usize, usize)) -> &mut Complex<f64> {
        let i = Alm::index(self, l, m);
        &mut self.data[i]
    }
}

impl AddAssign<&Alm> for Alm {
    fn add_assign(&mut self, rhs: &Alm) {
        assert!(self.same_shape(rhs), "adding coefficient sets of different shape");
        self.data
            .iter_mut()
            .zip(rhs.data.iter())
            .for_each(|(a, b)| *a += b);
    }
}
