pub mod healpix_fits;

pub use healpix_fits::{read_alm, read_map, read_stokes, write_alm, write_map};
