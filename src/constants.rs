/// Sentinel marking unobserved pixels.
pub const UNSEEN: f64 = -1.6375e30;

/// Relative tolerance used when testing for [`UNSEEN`].
pub const UNSEEN_RTOL: f64 = 1e-5;

pub const DEFAULT_ITER: usize = 3;
