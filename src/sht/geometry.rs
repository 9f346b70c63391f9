use std::{f64::consts::PI, ops::Range};

use num::complex::Complex;
use rayon::prelude::*;

use crate::{
    fft::RingFft,
    healpix::{nside2npix, nside2nring, ring_info, RingInfo},
};

/// Azimuthal orders transformed per analysis pass.
pub const M_BLOCK: usize = 32;

/// A northern ring and its mirror image in the southern hemisphere.
/// The equator ring has no partner.
#[derive(Clone, Copy, Debug)]
pub struct RingPair {
    pub north: usize,
    pub south: Option<usize>,
}

/// Ring layout, quadrature weight and FFT plans for one `nside`.
pub struct RingGeometry {
    nside: usize,
    rings: Vec<RingInfo>,
    pairs: Vec<RingPair>,
    fft: RingFft,
}

impl RingGeometry {
    pub fn new(nside: usize) -> Self {
        let nring = nside2nring(nside);
        let rings: Vec<_> = (1..=nring).map(|iring| ring_info(nside, iring)).collect();
        let pairs = (0..2 * nside)
            .map(|r| RingPair {
                north: r,
                south: if r + 1 < 2 * nside {
                    Some(nring - 1 - r)
                } else {
                    None
                },
            })
            .collect();
        let fft = RingFft::new(rings.iter().map(|r| r.nphi));
        Self {
            nside,
            rings,
            pairs,
            fft,
        }
    }

    pub fn nside(&self) -> usize {
        self.nside
    }

    pub fn npix(&self) -> usize {
        nside2npix(self.nside)
    }

    pub fn ring(&self, r: usize) -> &RingInfo {
        &self.rings[r]
    }

    pub fn pairs(&self) -> &[RingPair] {
        &self.pairs
    }

    /// Pixel area, the quadrature weight of every pixel.
    pub fn pixel_area(&self) -> f64 {
        4.0 * PI / self.npix() as f64
    }

    fn ring_slice<'a>(&self, map: &'a [f64], r: usize) -> &'a [f64] {
        let info = &self.rings[r];
        &map[info.first_pix..info.first_pix + info.nphi]
    }

    /// Weighted Fourier coefficients of every ring for the orders in `ms`;
    /// entry `[r][k]` holds order `ms.start + k` of ring `r`.
    pub fn fourier(&self, map: &[f64], ms: Range<usize>) -> Vec<Vec<Complex<f64>>> {
        let weight = self.pixel_area();
        (0..self.rings.len())
            .into_par_iter()
            .map(|r| {
                self.fft.analyze_ring(
                    self.ring_slice(map, r),
                    self.rings[r].phi0,
                    ms.clone(),
                    weight,
                )
            })
            .collect()
    }

    /// Orders `0..=mmax` split into consecutive blocks of at most
    /// [`M_BLOCK`], so analysis holds `nring * M_BLOCK` Fourier coefficients
    /// at a time.
    pub fn m_blocks(mmax: usize) -> impl Iterator<Item = Range<usize>> {
        (0..=mmax)
            .step_by(M_BLOCK)
            .map(move |start| start..(start + M_BLOCK).min(mmax + 1))
    }

    /// Ring samples from Fourier coefficients `F_m`, `m = 0..=mmax`.
    pub fn ring_samples(&self, r: usize, coeffs: &[Complex<f64>]) -> Vec<f64> {
        let info = &self.rings[r];
        self.fft.synthesize_ring(coeffs, info.phi0, info.nphi)
    }

    /// Assembles a map from per-ring samples computed pair by pair.
    pub fn scatter(&self, per_pair: Vec<(Vec<f64>, Option<Vec<f64>>)>) -> Vec<f64> {
        let mut map = vec![0.0; self.npix()];
        for (pair, (north, south)) in self.pairs.iter().zip(per_pair) {
            let info = &self.rings[pair.north];
            map[info.first_pix..info.first_pix + info.nphi].copy_from_slice(&north);
            if let (Some(s), Some(values)) = (pair.south, south) {
                let info = &self.rings[s];
                map[info.first_pix..info.first_pix + info.nphi].copy_from_slice(&values);
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_cover_all_rings() {
        for nside in [1, 2, 5] {
            let geom = RingGeometry::new(nside);
            let mut seen = vec![0; nside2nring(nside)];
            for pair in geom.pairs() {
                seen[pair.north] += 1;
                if let Some(s) = pair.south {
                    seen[s] += 1;
                    let n = geom.ring(pair.north);
                    let s = geom.ring(s);
                    assert!((n.z + s.z).abs() < 1e-14);
                } else {
                    assert_eq!(geom.ring(pair.north).z, 0.0);
                }
            }
            assert!(seen.iter().all(|&c| c == 1));
        }
    }

    #[test]
    fn test_m_blocks_cover_orders_once() {
        let blocks: Vec<_> = RingGeometry::m_blocks(70).collect();
        assert_eq!(blocks, vec![0..32, 32..64, 64..71]);
        assert_eq!(RingGeometry::m_blocks(3).collect::<Vec<_>>(), vec![0..4]);
        assert_eq!(RingGeometry::m_blocks(31).collect::<Vec<_>>(), vec![0..32]);
    }

    #[test]
    fn test_fourier_block_matches_full_range() {
        let geom = RingGeometry::new(4);
        let map: Vec<f64> = (0..geom.npix()).map(|p| ((p * 7) % 11) as f64 - 5.0).collect();
        let full = geom.fourier(&map, 0..12);
        let block = geom.fourier(&map, 4..9);
        for (f, b) in full.iter().zip(block.iter()) {
            assert_eq!(&f[4..9], &b[..]);
        }
    }

    #[test]
    fn test_scatter_places_rings() {
        let geom = RingGeometry::new(2);
        let per_pair = geom
            .pairs()
            .iter()
            .map(|p| {
                let n = vec![p.north as f64; geom.ring(p.north).nphi];
                let s = p.south.map(|s| vec![s as f64; geom.ring(s).nphi]);
                (n, s)
            })
            .collect();
        let map = geom.scatter(per_pair);
        assert_eq!(map.len(), 48);
        assert_eq!(map[0], 0.0);
        assert_eq!(map[47], 6.0);
        assert_eq!(map[20], 3.0);
    }
}
