use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::Centering;

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Spatial axis of a rectilinear grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Degenerate {axis} axis: {len} grid line(s), at least 2 required")]
    DegenerateAxis { axis: Axis, len: usize },

    #[error("{axis} axis is not strictly increasing at index {index} ({prev} -> {next})")]
    NonMonotonicAxis {
        axis: Axis,
        index: usize,
        prev: f64,
        next: f64,
    },

    #[error(
        "Shape mismatch for {centering} field '{field}': expected {expected_rows}x{expected_cols} ({expected_len} values), got {actual_len}"
    )]
    ShapeMismatch {
        field: String,
        centering: Centering,
        expected_rows: usize,
        expected_cols: usize,
        expected_len: usize,
        actual_len: usize,
    },

    #[error("Duplicate timestep {timestep}: {first} and {second}")]
    DuplicateTimestep {
        timestep: u64,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("No timestep token in file name: {path}")]
    MissingTimestepToken { path: PathBuf },
}
