//! In-memory representation of one rectilinear grid snapshot.

use std::collections::BTreeMap;

use ndarray::Array2;
use sf_core::{Axis, Centering, ValidationError, ValidationResult, check_axis};

/// Field name -> 2D array, ordered by name so iteration is deterministic.
pub type FieldMap = BTreeMap<String, Array2<f64>>;

/// Strictly increasing grid-line coordinates along one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateAxis {
    axis: Axis,
    values: Vec<f64>,
}

impl CoordinateAxis {
    pub fn new(axis: Axis, values: Vec<f64>) -> ValidationResult<Self> {
        check_axis(axis, &values)?;
        Ok(Self { axis, values })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// One timestep of grid data.
///
/// Point fields have shape `(ny, nx)`, cell fields `(ny - 1, nx - 1)`.
/// The constructor enforces both; there is no way to mutate a snapshot
/// once built.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSnapshot {
    x_axis: CoordinateAxis,
    y_axis: CoordinateAxis,
    point_fields: FieldMap,
    cell_fields: FieldMap,
}

impl GridSnapshot {
    pub fn new(
        x_axis: CoordinateAxis,
        y_axis: CoordinateAxis,
        point_fields: FieldMap,
        cell_fields: FieldMap,
    ) -> ValidationResult<Self> {
        let nx = x_axis.len();
        let ny = y_axis.len();
        for (centering, fields) in [(Centering::Point, &point_fields), (Centering::Cell, &cell_fields)]
        {
            let expected = centering.shape(nx, ny);
            for (name, array) in fields {
                if array.dim() != expected {
                    return Err(ValidationError::ShapeMismatch {
                        field: name.clone(),
                        centering,
                        expected_rows: expected.0,
                        expected_cols: expected.1,
                        expected_len: expected.0 * expected.1,
                        actual_len: array.len(),
                    });
                }
            }
        }
        Ok(Self {
            x_axis,
            y_axis,
            point_fields,
            cell_fields,
        })
    }

    pub fn x_axis(&self) -> &CoordinateAxis {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &CoordinateAxis {
        &self.y_axis
    }

    /// Number of grid lines along x.
    pub fn nx(&self) -> usize {
        self.x_axis.len()
    }

    /// Number of grid lines along y.
    pub fn ny(&self) -> usize {
        self.y_axis.len()
    }

    pub fn point_fields(&self) -> &FieldMap {
        &self.point_fields
    }

    pub fn cell_fields(&self) -> &FieldMap {
        &self.cell_fields
    }

    pub fn fields(&self, centering: Centering) -> &FieldMap {
        match centering {
            Centering::Point => &self.point_fields,
            Centering::Cell => &self.cell_fields,
        }
    }

    pub fn field(&self, centering: Centering, name: &str) -> Option<&Array2<f64>> {
        self.fields(centering).get(name)
    }

    /// Names of the fields available at `centering`, sorted.
    pub fn field_names(&self, centering: Centering) -> Vec<&str> {
        self.fields(centering).keys().map(String::as_str).collect()
    }

    /// The x axis tiled across rows: shape `(ny, nx)`, `grid[[j, i]] == x[i]`.
    pub fn x_grid(&self) -> Array2<f64> {
        let x = self.x_axis.values();
        Array2::from_shape_fn((self.ny(), self.nx()), |(_, i)| x[i])
    }

    /// The y axis tiled across columns: shape `(ny, nx)`, `grid[[j, i]] == y[j]`.
    pub fn y_grid(&self) -> Array2<f64> {
        let y = self.y_axis.values();
        Array2::from_shape_fn((self.ny(), self.nx()), |(j, _)| y[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes() -> (CoordinateAxis, CoordinateAxis) {
        (
            CoordinateAxis::new(Axis::X, vec![0.0, 1.0, 2.0, 3.0]).unwrap(),
            CoordinateAxis::new(Axis::Y, vec![0.0, 0.5, 1.0]).unwrap(),
        )
    }

    #[test]
    fn accepts_matching_shapes() {
        let (x, y) = axes();
        let mut points = FieldMap::new();
        points.insert("x_vel".to_string(), Array2::zeros((3, 4)));
        let mut cells = FieldMap::new();
        cells.insert("density".to_string(), Array2::zeros((2, 3)));

        let snap = GridSnapshot::new(x, y, points, cells).unwrap();
        assert_eq!(snap.nx(), 4);
        assert_eq!(snap.ny(), 3);
        assert_eq!(snap.field_names(Centering::Point), vec!["x_vel"]);
        assert!(snap.field(Centering::Cell, "density").is_some());
        assert!(snap.field(Centering::Point, "density").is_none());
    }

    #[test]
    fn rejects_cell_field_with_point_shape() {
        let (x, y) = axes();
        let mut cells = FieldMap::new();
        cells.insert("density".to_string(), Array2::zeros((3, 4)));

        let err = GridSnapshot::new(x, y, FieldMap::new(), cells).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ShapeMismatch {
                centering: Centering::Cell,
                expected_rows: 2,
                expected_cols: 3,
                ..
            }
        ));
    }

    #[test]
    fn coordinate_grids_broadcast() {
        let (x, y) = axes();
        let snap = GridSnapshot::new(x, y, FieldMap::new(), FieldMap::new()).unwrap();

        let xg = snap.x_grid();
        let yg = snap.y_grid();
        assert_eq!(xg.dim(), (3, 4));
        assert_eq!(yg.dim(), (3, 4));
        for j in 0..3 {
            for i in 0..4 {
                assert_eq!(xg[[j, i]], snap.x_axis().values()[i]);
                assert_eq!(yg[[j, i]], snap.y_axis().values()[j]);
            }
        }
    }
}
