use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ndarray::Array2;
use proptest::prelude::*;
use sf_core::{Axis, Centering, ValidationError};
use sf_grid::vtk::{self, Encoding};
use sf_grid::{CoordinateAxis, DecodeError, FieldMap, GridSnapshot, GridSnapshotReader};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn sample_snapshot(nx: usize, ny: usize) -> GridSnapshot {
    let x = CoordinateAxis::new(Axis::X, (0..nx).map(|i| i as f64 * 0.25).collect()).unwrap();
    let y = CoordinateAxis::new(Axis::Y, (0..ny).map(|j| j as f64 * 0.5).collect()).unwrap();

    let mut points = FieldMap::new();
    points.insert(
        "x_vel".to_string(),
        Array2::from_shape_fn((ny, nx), |(j, i)| (i + 10 * j) as f64),
    );
    points.insert("y_vel".to_string(), Array2::from_elem((ny, nx), -0.5));

    let mut cells = FieldMap::new();
    cells.insert(
        "density".to_string(),
        Array2::from_shape_fn((ny - 1, nx - 1), |(j, i)| 1.0 + (i * j) as f64),
    );
    cells.insert("pressure".to_string(), Array2::from_elem((ny - 1, nx - 1), 0.4));

    GridSnapshot::new(x, y, points, cells).unwrap()
}

#[test]
fn read_ascii_and_binary_files() {
    let dir = unique_temp_dir("sf_grid_read");
    fs::create_dir_all(&dir).expect("failed to create temp dir");

    let snapshot = sample_snapshot(5, 4);
    let reader = GridSnapshotReader::default();

    for (encoding, name) in [
        (Encoding::Ascii, "clover.00001.00010.vtk"),
        (Encoding::Binary, "clover.00001.00020.vtk"),
    ] {
        let path = dir.join(name);
        let mut bytes = Vec::new();
        vtk::encode(&snapshot, encoding, &mut bytes).expect("encode failed");
        fs::write(&path, bytes).expect("failed to write snapshot");

        let loaded = reader.read(&path).expect("failed to read snapshot");
        assert_eq!(loaded, snapshot);
        assert_eq!(
            loaded.field_names(Centering::Cell),
            vec!["density", "pressure"]
        );
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn corrupt_file_reports_decode_error() {
    let dir = unique_temp_dir("sf_grid_corrupt");
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    let path = dir.join("clover.00001.00003.vtk");
    fs::write(&path, "not a vtk file\n").expect("failed to write file");

    let err = GridSnapshotReader::default().read(&path).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedHeader { line: 1, .. }));

    let _ = fs::remove_dir_all(&dir);
}

const SMALL_GRID: &str = "# vtk DataFile Version 3.0
t
ASCII
DATASET RECTILINEAR_GRID
DIMENSIONS 3 2 1
X_COORDINATES 3 double
0 1 2
Y_COORDINATES 2 double
0 1
Z_COORDINATES 1 double
0
CELL_DATA 2
FIELD FieldData 1
density 1 2 double
1.5 2.5
";

#[test]
fn oversized_header_counts_are_errors() {
    let reader = GridSnapshotReader::default();
    assert!(reader.decode(SMALL_GRID.as_bytes()).is_ok());

    let huge_axis = SMALL_GRID.replace("X_COORDINATES 3 double", "X_COORDINATES 18446744073709551615 double");
    assert!(matches!(
        reader.decode(huge_axis.as_bytes()),
        Err(DecodeError::MalformedHeader { line: 6, .. })
    ));

    let huge_grid = SMALL_GRID.replace("DIMENSIONS 3 2 1", "DIMENSIONS 4294967296 4294967296 1");
    assert!(matches!(
        reader.decode(huge_grid.as_bytes()),
        Err(DecodeError::MalformedHeader { line: 5, .. })
    ));

    let huge_field = SMALL_GRID.replace("density 1 2 double", "density 8589934592 8589934592 double");
    assert!(matches!(
        reader.decode(huge_field.as_bytes()),
        Err(DecodeError::Validation(ValidationError::ShapeMismatch { .. }))
    ));

    let huge_components = SMALL_GRID.replace("density 1 2 double", "density 8589934592 2 double");
    assert!(matches!(
        reader.decode(huge_components.as_bytes()),
        Err(DecodeError::UnexpectedEof { .. })
    ));

    let huge_table = format!("{SMALL_GRID}LOOKUP_TABLE colours 18446744073709551615\n");
    assert!(matches!(
        reader.decode(huge_table.as_bytes()),
        Err(DecodeError::MalformedHeader { line: 16, .. })
    ));
}

proptest! {
    #[test]
    fn decoded_shapes_follow_centering(nx in 2usize..9, ny in 2usize..9) {
        let snapshot = sample_snapshot(nx, ny);
        let mut bytes = Vec::new();
        vtk::encode(&snapshot, Encoding::Ascii, &mut bytes).unwrap();
        let decoded = GridSnapshotReader::default().decode(&bytes).unwrap();

        for field in decoded.point_fields().values() {
            prop_assert_eq!(field.dim(), (decoded.y_axis().len(), decoded.x_axis().len()));
        }
        for field in decoded.cell_fields().values() {
            prop_assert_eq!(field.dim(), (decoded.y_axis().len() - 1, decoded.x_axis().len() - 1));
        }
    }
}
