use std::f64::consts::{FRAC_PI_2, PI};

use super::utils::{ncap, nside2npix, ring_info};

/// Polar (colatitude) and azimuthal angles in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphCoord {
    pub pol: f64,
    pub az: f64,
}

impl SphCoord {
    pub fn new(pol: f64, az: f64) -> Self {
        Self { pol, az }
    }

    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        let r = (x * x + y * y).sqrt();
        Self {
            pol: r.atan2(z),
            az: y.atan2(x),
        }
    }

    pub fn to_xyz(self) -> [f64; 3] {
        let (st, ct) = self.pol.sin_cos();
        let (sp, cp) = self.az.sin_cos();
        [st * cp, st * sp, ct]
    }
}

fn isqrt(v: usize) -> usize {
    let mut r = (v as f64).sqrt() as usize;
    while r * r > v {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= v {
        r += 1;
    }
    r
}

/// 1-based ring number of a RING pixel.
pub fn pix2ring_ring(nside: usize, ipix: usize) -> usize {
    let npix = nside2npix(nside);
    let ncap = ncap(nside);
    if ipix < ncap {
        (1 + isqrt(1 + 2 * ipix)) >> 1
    } else if ipix < npix - ncap {
        (ipix - ncap) / (4 * nside) + nside
    } else {
        let ip = npix - ipix;
        4 * nside - ((1 + isqrt(2 * ip - 1)) >> 1)
    }
}

pub fn pix2ang_ring(nside: usize, ipix: usize) -> SphCoord {
    let info = ring_info(nside, pix2ring_ring(nside, ipix));
    let iphi = ipix - info.first_pix;
    SphCoord {
        pol: info.theta(),
        az: info.phi0 + 2.0 * PI * iphi as f64 / info.nphi as f64,
    }
}

pub fn pix2vec_ring(nside: usize, ipix: usize) -> [f64; 3] {
    pix2ang_ring(nside, ipix).to_xyz()
}

pub fn ang2pix_ring(nside: usize, dir: SphCoord) -> usize {
    let n = nside as i64;
    let npix = nside2npix(nside) as i64;
    let z = dir.pol.cos();
    let za = z.abs();
    let tt = dir.az.rem_euclid(2.0 * PI) / FRAC_PI_2;

    let ipix = if za <= 2.0 / 3.0 {
        let temp1 = n as f64 * (0.5 + tt);
        let temp2 = n as f64 * z * 0.75;
        let jp = (temp1 - temp2) as i64;
        let jm = (temp1 + temp2) as i64;
        // ring counted from z=2/3
        let ir = n + 1 + jp - jm;
        let kshift = 1 - (ir & 1);
        let ip = ((jp + jm - n + kshift + 1) / 2).rem_euclid(4 * n);
        ncap(nside) as i64 + (ir - 1) * 4 * n + ip
    } else {
        let tp = tt - tt.floor();
        let tmp = n as f64 * dir.pol.sin() * (3.0 / (1.0 + za)).sqrt();
        let jp = (tp * tmp) as i64;
        let jm = ((1.0 - tp) * tmp) as i64;
        let ir = jp + jm + 1;
        let ip = ((tt * ir as f64) as i64).rem_euclid(4 * ir);
        if z > 0.0 {
            2 * ir * (ir - 1) + ip
        } else {
            npix - 2 * ir * (ir + 1) + ip
        }
    };
    ipix as usize
}
