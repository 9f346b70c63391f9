//! Gnomonic cutouts of sphere maps.

use ndarray::Array2;

use crate::{
    healpix::{ang2pix_ring, ring2nest, SphCoord},
    map::{Ordering, SphereMap},
};

/// Tangent-plane patch centred on `(lon, lat)` in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gnomonic {
    pub lon: f64,
    pub lat: f64,
    pub xsize: usize,
    pub ysize: usize,
    /// arcmin per pixel
    pub reso: f64,
}

impl Gnomonic {
    pub fn square(lon: f64, lat: f64, xsize: usize, reso: f64) -> Self {
        Self {
            lon,
            lat,
            xsize,
            ysize: xsize,
            reso,
        }
    }

    /// Direction seen through cutout pixel `(row, col)`. Row 0 is the
    /// bottom edge, longitude grows to the left.
    pub fn direction(&self, row: usize, col: usize) -> SphCoord {
        let reso = (self.reso / 60.0).to_radians();
        let x = (col as f64 + 0.5 - self.xsize as f64 / 2.0) * reso;
        let y = (row as f64 + 0.5 - self.ysize as f64 / 2.0) * reso;

        let (sl, cl) = self.lon.to_radians().sin_cos();
        let (sb, cb) = self.lat.to_radians().sin_cos();
        let radial = [cb * cl, cb * sl, sb];
        let east = [-sl, cl, 0.0];
        let north = [-sb * cl, -sb * sl, cb];

        let v: Vec<f64> = (0..3)
            .map(|k| radial[k] - x * east[k] + y * north[k])
            .collect();
        SphCoord::from_xyz(v[0], v[1], v[2])
    }

    /// Nearest-pixel samples of `map`, shape `(ysize, xsize)`.
    pub fn project(&self, map: &SphereMap) -> Array2<f64> {
        let nside = map.nside();
        Array2::from_shape_fn((self.ysize, self.xsize), |(row, col)| {
            let ipix = ang2pix_ring(nside, self.direction(row, col));
            let ipix = match map.ordering() {
                Ordering::Ring => ipix,
                Ordering::Nested => ring2nest(nside, ipix),
            };
            map[ipix]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::healpix::pix2ang_ring;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_centre_pixel() {
        let map = SphereMap::from_fn(16, |p| p as f64).unwrap();
        let view = Gnomonic::square(170.0, -15.0, 5, 30.0);
        let cut = view.project(&map);
        assert_eq!(cut.dim(), (5, 5));
        let centre = SphCoord::new(FRAC_PI_2 + 15f64.to_radians(), 170f64.to_radians());
        assert_eq!(cut[[2, 2]], ang2pix_ring(16, centre) as f64);
    }

    #[test]
    fn test_orientation() {
        let nside = 64;
        let lon = SphereMap::from_fn(nside, |p| pix2ang_ring(nside, p).az).unwrap();
        let colat = SphereMap::from_fn(nside, |p| pix2ang_ring(nside, p).pol).unwrap();
        let view = Gnomonic {
            lon: 90.0,
            lat: 0.0,
            xsize: 11,
            ysize: 9,
            reso: 60.0,
        };
        let cut = view.project(&lon);
        assert_eq!(cut.dim(), (9, 11));
        assert!(cut[[4, 0]] > cut[[4, 10]]);
        let cut = view.project(&colat);
        assert!(cut[[0, 5]] > cut[[8, 5]]);
    }

    #[test]
    fn test_nested_map_gives_same_cutout() {
        let map = SphereMap::from_fn(8, |p| (p * 7 % 13) as f64).unwrap();
        let nested = map.to_ordering(Ordering::Nested).unwrap();
        let view = Gnomonic::square(10.0, 45.0, 7, 120.0);
        assert_eq!(view.project(&map), view.project(&nested));
    }
}
