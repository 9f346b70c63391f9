use std::f64::consts::PI;

pub fn nside2npix(nside: usize) -> usize {
    12 * nside * nside
}

/// Inverse of [`nside2npix`]; `None` when `npix` is not `12·nside²`.
pub fn npix2nside(npix: usize) -> Option<usize> {
    if npix == 0 || npix % 12 != 0 {
        return None;
    }
    let n2 = npix / 12;
    let nside = (n2 as f64).sqrt().round() as usize;
    if nside * nside == n2 {
        Some(nside)
    } else {
        None
    }
}

pub fn nside2nring(nside: usize) -> usize {
    4 * nside - 1
}

pub fn is_power_of_two(n: usize) -> bool {
    n > 0 && n & (n - 1) == 0
}

/// Number of pixels in the north polar cap.
pub fn ncap(nside: usize) -> usize {
    2 * nside * (nside - 1)
}

/// Geometry of one iso-latitude ring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingInfo {
    pub first_pix: usize,
    pub nphi: usize,
    pub z: f64,
    pub sin_theta: f64,
    /// azimuth of the first pixel in the ring
    pub phi0: f64,
}

impl RingInfo {
    pub fn theta(&self) -> f64 {
        self.sin_theta.atan2(self.z)
    }
}

/// `iring` is 1-based and runs from the north pole, `1..=4*nside-1`.
pub fn ring_info(nside: usize, iring: usize) -> RingInfo {
    let northern = iring <= 2 * nside;
    let ir = if northern { iring } else { 4 * nside - iring };
    let nsidef = nside as f64;

    let (first, nphi, z, sin_theta, shifted) = if ir < nside {
        let tmp = (ir * ir) as f64 / (3.0 * nsidef * nsidef);
        (
            2 * ir * (ir - 1),
            4 * ir,
            1.0 - tmp,
            (tmp * (2.0 - tmp)).sqrt(),
            true,
        )
    } else {
        let z = (2.0 * nsidef - ir as f64) * 2.0 / (3.0 * nsidef);
        (
            ncap(nside) + (ir - nside) * 4 * nside,
            4 * nside,
            z,
            ((1.0 - z) * (1.0 + z)).sqrt(),
            (ir - nside) % 2 == 0,
        )
    };

    let phi0 = if shifted { PI / nphi as f64 } else { 0.0 };

    if northern {
        RingInfo {
            first_pix: first,
            nphi,
            z,
            sin_theta,
            phi0,
        }
    } else {
        RingInfo {
            first_pix: nside2npix(nside) - first - nphi,
            nphi,
            z: -z,
            sin_theta,
            phi0,
        }
    }
}

pub fn ring2z_ring(nside: usize, iring: usize) -> f64 {
    ring_info(nside, iring).z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_counts() {
        assert_eq!(nside2npix(1), 12);
        assert_eq!(nside2npix(2), 48);
        assert_eq!(npix2nside(48), Some(2));
        assert_eq!(npix2nside(12 * 2048 * 2048), Some(2048));
        assert_eq!(npix2nside(12 * 3 * 3), Some(3));
        assert_eq!(npix2nside(50), None);
        assert_eq!(npix2nside(0), None);
        assert_eq!(npix2nside(24), None);
        assert_eq!(nside2nring(16), 63);
    }

    #[test]
    fn test_rings_tile_the_sphere() {
        for nside in [1, 2, 3, 4, 8] {
            let mut next = 0;
            for iring in 1..=nside2nring(nside) {
                let info = ring_info(nside, iring);
                assert_eq!(info.first_pix, next, "nside {nside} ring {iring}");
                next += info.nphi;
                assert!((info.z * info.z + info.sin_theta * info.sin_theta - 1.0).abs() < 1e-12);
            }
            assert_eq!(next, nside2npix(nside));
        }
    }

    #[test]
    fn test_rings_are_mirror_symmetric() {
        let nside = 4;
        let nring = nside2nring(nside);
        for iring in 1..=nring {
            let north = ring_info(nside, iring);
            let south = ring_info(nside, nring + 1 - iring);
            assert_eq!(north.nphi, south.nphi);
            assert!((north.z + south.z).abs() < 1e-14);
            assert_eq!(north.phi0, south.phi0);
        }
        assert_eq!(ring2z_ring(nside, 2 * nside), 0.0);
    }
}
