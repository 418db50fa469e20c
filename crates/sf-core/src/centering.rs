//! Where a field's values live on a rectilinear grid.

use std::fmt;

/// Attachment of a data array to the grid.
///
/// Point fields sit on grid-line intersections and have shape `(ny, nx)`.
/// Cell fields sit on cell centres and have shape `(ny - 1, nx - 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Centering {
    Point,
    Cell,
}

impl Centering {
    /// `(rows, cols)` of a field with this centering on an `nx` by `ny` grid.
    pub fn shape(self, nx: usize, ny: usize) -> (usize, usize) {
        match self {
            Centering::Point => (ny, nx),
            Centering::Cell => (ny.saturating_sub(1), nx.saturating_sub(1)),
        }
    }

    /// Value count of such a field, `None` when it does not fit in `usize`.
    pub fn len(self, nx: usize, ny: usize) -> Option<usize> {
        let (rows, cols) = self.shape(nx, ny);
        rows.checked_mul(cols)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Centering::Point => "point",
            Centering::Cell => "cell",
        }
    }
}

impl fmt::Display for Centering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_and_cell_shapes() {
        assert_eq!(Centering::Point.shape(4, 3), (3, 4));
        assert_eq!(Centering::Cell.shape(4, 3), (2, 3));
        assert_eq!(Centering::Cell.len(4, 3), Some(6));
        assert_eq!(Centering::Point.len(usize::MAX, 2), None);
    }
}
