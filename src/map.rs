use serde::{Deserialize, Serialize};

use crate::{
    error::MapError,
    healpix::{is_power_of_two, npix2nside, nside2npix, reorder_n2r, reorder_r2n},
};

/// Pixel index scheme of a [`SphereMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Ordering {
    #[default]
    Ring,
    Nested,
}

impl Ordering {
    pub fn from_nest(nest: bool) -> Self {
        if nest {
            Ordering::Nested
        } else {
            Ordering::Ring
        }
    }

    /// Value of the FITS `ORDERING` keyword.
    pub fn fits_keyword(self) -> &'static str {
        match self {
            Ordering::Ring => "RING",
            Ordering::Nested => "NESTED",
        }
    }

    pub fn from_fits_keyword(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "RING" => Some(Ordering::Ring),
            "NESTED" | "NEST" => Some(Ordering::Nested),
            _ => None,
        }
    }
}

/// Samples on the HEALPix sphere pixelization.
#[derive(Clone, Debug, PartialEq)]
pub struct SphereMap {
    nside: usize,
    ordering: Ordering,
    data: Vec<f64>,
}

impl SphereMap {
    pub fn new(data: Vec<f64>, ordering: Ordering) -> Result<Self, MapError> {
        let nside = npix2nside(data.len()).ok_or(MapError::InvalidPixelCount { npix: data.len() })?;
        if ordering == Ordering::Nested && !is_power_of_two(nside) {
            return Err(MapError::NestedNside { nside });
        }
        Ok(Self {
            nside,
            ordering,
            data,
        })
    }

    /// RING-ordered map with every sample set to `value`.
    pub fn full(nside: usize, value: f64) -> Result<Self, MapError> {
        Self::from_fn(nside, |_| value)
    }

    pub fn zeros(nside: usize) -> Result<Self, MapError> {
        Self::full(nside, 0.0)
    }

    /// RING-ordered map from `f(ipix)`.
    pub fn from_fn(nside: usize, f: impl FnMut(usize) -> f64) -> Result<Self, MapError> {
        if nside == 0 {
            return Err(MapError::InvalidNside { nside });
        }
        Ok(Self {
            nside,
            ordering: Ordering::Ring,
            data: (0..nside2npix(nside)).map(f).collect(),
        })
    }

    pub fn nside(&self) -> usize {
        self.nside
    }

    pub fn npix(&self) -> usize {
        self.data.len()
    }

    pub fn ordering(&self) -> Ordering {
        self.ordering
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.data.iter()
    }

    /// New map with the same samples in the requested ordering.
    pub fn to_ordering(&self, ordering: Ordering) -> Result<SphereMap, MapError> {
        let data = match (self.ordering, ordering) {
            (Ordering::Ring, Ordering::Ring) | (Ordering::Nested, Ordering::Nested) => {
                self.data.clone()
            }
            (Ordering::Nested, Ordering::Ring) => reorder_n2r(self.nside, &self.data),
            (Ordering::Ring, Ordering::Nested) => {
                if !is_power_of_two(self.nside) {
                    return Err(MapError::NestedNside { nside: self.nside });
                }
                reorder_r2n(self.nside, &self.data)
            }
        };
        Ok(SphereMap {
            nside: self.nside,
            ordering,
            data,
        })
    }

    /// Map on the same grid as `self` holding `data`.
    pub(crate) fn with_samples(&self, data: Vec<f64>) -> SphereMap {
        debug_assert_eq!(data.len(), self.data.len());
        SphereMap {
            nside: self.nside,
            ordering: self.ordering,
            data,
        }
    }

    pub fn same_grid(&self, other: &SphereMap) -> bool {
        self.nside == other.nside && self.ordering == other.ordering
    }

    pub(crate) fn describe(&self) -> String {
        format!("nside {} {:?} ({} pixels)", self.nside, self.ordering, self.npix())
    }
}

impl std::ops::Index<usize> for SphereMap {
    type Output = f64;

    fn index(&self, ipix: usize) -> &f64 {
        &self.data[ipix]
    }
}

/// Co-registered intensity and linear polarization maps.
#[derive(Clone, Debug)]
pub struct StokesTriple {
    pub i: SphereMap,
    pub q: SphereMap,
    pub u: SphereMap,
}

impl StokesTriple {
    pub fn new(i: SphereMap, q: SphereMap, u: SphereMap) -> Result<Self, MapError> {
        for other in [&q, &u] {
            if !i.same_grid(other) {
                return Err(MapError::NotCoRegistered {
                    left: i.describe(),
                    right: other.describe(),
                });
            }
        }
        Ok(Self { i, q, u })
    }

    pub fn nside(&self) -> usize {
        self.i.nside()
    }
}
