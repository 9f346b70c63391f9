//! HEALPix pixelization: ring geometry, pixel/angle conversion, RING/NESTED
//! index conversion.

pub mod nest;
pub mod pix;
pub mod utils;

pub use nest::{nest2ring, reorder_n2r, reorder_r2n, ring2nest};
pub use pix::{ang2pix_ring, pix2ang_ring, pix2ring_ring, pix2vec_ring, SphCoord};
pub use utils::{
    is_power_of_two, npix2nside, nside2npix, nside2nring, ring2z_ring, ring_info,
    RingInfo,
};
