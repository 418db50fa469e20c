//! Axis and shape checks shared by the reader and the packer.

use crate::{Axis, Centering, ValidationError, ValidationResult};

/// A usable coordinate axis has at least two lines and strictly increases.
pub fn check_axis(axis: Axis, values: &[f64]) -> ValidationResult<()> {
    if values.len() < 2 {
        return Err(ValidationError::DegenerateAxis {
            axis,
            len: values.len(),
        });
    }
    for (index, pair) in values.windows(2).enumerate() {
        // written as a negation so NaN coordinates are rejected too
        if !(pair[1] > pair[0]) {
            return Err(ValidationError::NonMonotonicAxis {
                axis,
                index: index + 1,
                prev: pair[0],
                next: pair[1],
            });
        }
    }
    Ok(())
}

/// Check that `actual_len` values fill a `centering` field on an `nx` by `ny` grid exactly.
pub fn check_shape(
    field: &str,
    centering: Centering,
    nx: usize,
    ny: usize,
    actual_len: usize,
) -> ValidationResult<(usize, usize)> {
    let (rows, cols) = centering.shape(nx, ny);
    let expected = centering.len(nx, ny);
    if expected != Some(actual_len) {
        return Err(ValidationError::ShapeMismatch {
            field: field.to_string(),
            centering,
            expected_rows: rows,
            expected_cols: cols,
            expected_len: expected.unwrap_or(usize::MAX),
            actual_len,
        });
    }
    Ok((rows, cols))
}
