use std::path::PathBuf;

use sf_core::Centering;
use thiserror::Error;

pub type PackResult<T> = Result<T, PackError>;
pub type NpyResult<T> = Result<T, NpyError>;
pub type BundleResult<T> = Result<T, BundleError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PackError {
    #[error("Required {centering} field '{name}' missing for timestep {timestep}")]
    MissingField {
        name: String,
        centering: Centering,
        timestep: u64,
    },

    #[error("Field '{name}' is {actual_rows}x{actual_cols}, bundle layer needs {rows}x{cols}")]
    ShapeMismatch {
        name: String,
        rows: usize,
        cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("Bundle must hold {expected} layers, got {actual}")]
    LayerCount { expected: usize, actual: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NpyError {
    #[error("Not an .npy file (bad magic)")]
    BadMagic,

    #[error("Unsupported .npy format version {0}")]
    UnsupportedVersion(u8),

    #[error("Truncated .npy data: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Invalid .npy header: {0}")]
    BadHeader(String),

    #[error("Unsupported dtype '{0}', only 64-bit floats are handled")]
    UnsupportedDtype(String),

    #[error("Expected a {expected}-dimensional array, got {actual} dimensions")]
    Dimensions { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bad bundle file {path}: {source}")]
    Npy {
        path: PathBuf,
        #[source]
        source: NpyError,
    },

    #[error("No bundle stored for timestep {timestep}")]
    NotFound { timestep: u64 },

    #[error(transparent)]
    Pack(#[from] PackError),
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BundleError::Io {
            path: path.into(),
            source,
        }
    }
}
