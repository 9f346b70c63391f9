//! Error types for every pipeline stage.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid sphere map construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("{npix} is not a valid HEALPix pixel count")]
    InvalidPixelCount { npix: usize },

    #[error("nside must be positive, got {nside}")]
    InvalidNside { nside: usize },

    #[error("NESTED ordering needs a power-of-two nside, got {nside}")]
    NestedNside { nside: usize },

    #[error("maps are not co-registered: {left} vs {right}")]
    NotCoRegistered { left: String, right: String },
}

/// Failures of the map loader.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("malformed FITS file {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("field {field} does not exist in {path} ({available} fields present)")]
    MissingField {
        path: PathBuf,
        field: usize,
        available: usize,
    },

    #[error("invalid map in {path}: {source}")]
    InvalidMap {
        path: PathBuf,
        #[source]
        source: MapError,
    },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReadError {
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Failures of the spherical-harmonic transforms.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("lmax {lmax} exceeds the safe bandlimit {max} for nside {nside}")]
    LmaxTooLarge { lmax: usize, max: usize, nside: usize },

    #[error("map has {got} pixels, the transform expects {expected}")]
    PixelCount { expected: usize, got: usize },

    #[error("Q and U are not co-registered: {q_npix} vs {u_npix} pixels")]
    Mismatch { q_npix: usize, u_npix: usize },

    #[error("E and B coefficient sets differ in shape: (lmax {e_lmax}, mmax {e_mmax}) vs (lmax {b_lmax}, mmax {b_mmax})")]
    AlmMismatch {
        e_lmax: usize,
        e_mmax: usize,
        b_lmax: usize,
        b_mmax: usize,
    },

    #[error("invalid map: {0}")]
    Map(#[from] MapError),
}

/// Failures of the map writer.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("refusing to overwrite existing file {path}")]
    Conflict { path: PathBuf },

    #[error("nothing to write to {path}: {message}")]
    InvalidData { path: PathBuf, message: String },

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("FITS error writing {path}: {source}")]
    Fits {
        path: PathBuf,
        #[source]
        source: fitsio::errors::Error,
    },
}

/// Failures loading the pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot open config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransformError::LmaxTooLarge {
            lmax: 20,
            max: 5,
            nside: 2,
        };
        assert_eq!(
            format!("{err}"),
            "lmax 20 exceeds the safe bandlimit 5 for nside 2"
        );

        let err = WriteError::Conflict {
            path: PathBuf::from("E_map.fits"),
        };
        assert_eq!(
            format!("{err}"),
            "refusing to overwrite existing file E_map.fits"
        );
    }

    #[test]
    fn test_stage_errors_convert() {
        let err: Error = MapError::InvalidPixelCount { npix: 7 }.into();
        assert!(matches!(err, Error::Map(_)));

        let err: Error = TransformError::Mismatch {
            q_npix: 48,
            u_npix: 192,
        }
        .into();
        assert!(matches!(err, Error::Transform(_)));
    }
}
