use std::path::PathBuf;

use sf_bundle::PackError;
use sf_core::ValidationError;
use sf_grid::DecodeError;
use thiserror::Error;

pub type SeriesResult<T> = Result<T, SeriesError>;

/// A solver-log problem. Never fatal: the block is dropped and the
/// error is logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogParseError {
    #[error("Cannot read solver log {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Solver log block at line {line}: {reason}")]
    Block { line: usize, reason: String },
}

/// Why one snapshot could not be turned into a bundle.
#[derive(Error, Debug)]
pub enum SnapshotFailure {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Pack(#[from] PackError),
}

#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Snapshot {path} (timestep {timestep}) failed: {source}")]
    Snapshot {
        path: PathBuf,
        timestep: u64,
        #[source]
        source: SnapshotFailure,
    },

    #[error("Invalid pipeline configuration: {0}")]
    Config(String),
}
