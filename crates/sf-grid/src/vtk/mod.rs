//! Legacy VTK `RECTILINEAR_GRID` files.
//!
//! Layout understood by [`decode`]:
//!
//! ```text
//! # vtk DataFile Version 3.0
//! <title>
//! ASCII | BINARY
//! DATASET RECTILINEAR_GRID
//! DIMENSIONS nx ny 1
//! X_COORDINATES nx <type>
//! Y_COORDINATES ny <type>
//! Z_COORDINATES 1 <type>
//! CELL_DATA (nx-1)*(ny-1)
//! FIELD FieldData <n>
//! <name> <ncomp> <ntuples> <type>
//! SCALARS <name> <type> [ncomp]
//! LOOKUP_TABLE default
//! VECTORS <name> <type>
//! POINT_DATA nx*ny
//! ...
//! ```
//!
//! BINARY data blocks are big-endian. Arrays with more than one component
//! are split into one field per component using the configured suffixes.

mod data_type;
mod lexer;

use std::io::Write;

pub use data_type::DataType;

use lexer::Cursor;
use ndarray::Array2;
use sf_core::{Axis, Centering, check_shape};

use crate::error::{DecodeError, DecodeResult};
use crate::reader::ReaderConfig;
use crate::snapshot::{CoordinateAxis, FieldMap, GridSnapshot};

const MAGIC: &str = "# vtk DataFile Version";

/// Data block encoding declared on line 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    Binary,
}

/// One data array as found in the file, before reshaping.
struct RawArray {
    name: String,
    centering: Centering,
    components: usize,
    values: Vec<f64>,
    line: usize,
}

#[derive(Default)]
struct RawGrid {
    dimensions: Option<(usize, usize)>,
    x: Option<Vec<f64>>,
    y: Option<Vec<f64>>,
    arrays: Vec<RawArray>,
    /// Line just past the last one read, for errors about missing sections.
    end_line: usize,
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    encoding: Encoding,
    /// `(nx, ny)` once DIMENSIONS has been read; every later count is checked against it.
    dimensions: Option<(usize, usize)>,
    section: Option<Centering>,
    point_count: Option<usize>,
    cell_count: Option<usize>,
}

/// Decode a whole file held in memory.
pub fn decode(bytes: &[u8], config: &ReaderConfig) -> DecodeResult<GridSnapshot> {
    let mut cursor = Cursor::new(bytes);

    let magic = cursor.raw_line().unwrap_or_default();
    if !magic.trim_start().starts_with(MAGIC) {
        return Err(DecodeError::header(1, "missing '# vtk DataFile Version' line"));
    }
    if cursor.raw_line().is_none() {
        return Err(DecodeError::UnexpectedEof {
            context: "title line".to_string(),
        });
    }
    let encoding_line = cursor.line();
    let encoding = match cursor.raw_line().map(str::trim) {
        Some(e) if e.eq_ignore_ascii_case("ASCII") => Encoding::Ascii,
        Some(e) if e.eq_ignore_ascii_case("BINARY") => Encoding::Binary,
        Some(other) => {
            return Err(DecodeError::header(
                encoding_line,
                format!("expected ASCII or BINARY, found '{other}'"),
            ));
        }
        None => {
            return Err(DecodeError::UnexpectedEof {
                context: "encoding line".to_string(),
            });
        }
    };

    let mut parser = Parser {
        cursor,
        encoding,
        dimensions: None,
        section: None,
        point_count: None,
        cell_count: None,
    };
    let raw = parser.parse_body()?;
    build_snapshot(raw, config)
}

impl<'a> Parser<'a> {
    fn parse_body(&mut self) -> DecodeResult<RawGrid> {
        let mut raw = RawGrid::default();

        let Some((line, tokens)) = self.cursor.keyword_line()? else {
            return Err(DecodeError::UnexpectedEof {
                context: "DATASET line".to_string(),
            });
        };
        match tokens.as_slice() {
            [kw, kind] if kw.eq_ignore_ascii_case("DATASET") => {
                if !kind.eq_ignore_ascii_case("RECTILINEAR_GRID") {
                    return Err(DecodeError::UnsupportedDataset {
                        what: kind.to_string(),
                    });
                }
            }
            _ => return Err(DecodeError::header(line, "expected 'DATASET RECTILINEAR_GRID'")),
        }

        while let Some((line, tokens)) = self.cursor.keyword_line()? {
            let Some(keyword) = tokens.first() else {
                continue;
            };
            match keyword.to_ascii_uppercase().as_str() {
                "DIMENSIONS" => self.dimensions_line(&tokens, line)?,
                "X_COORDINATES" => raw.x = Some(self.coordinates(&tokens, line, Axis::X)?),
                "Y_COORDINATES" => raw.y = Some(self.coordinates(&tokens, line, Axis::Y)?),
                // a planar grid has a single Z line; its value is not needed
                "Z_COORDINATES" => {
                    self.coordinates(&tokens, line, Axis::Z)?;
                }
                "POINT_DATA" => {
                    self.point_count = Some(self.section_header(&tokens, line, Centering::Point)?);
                    self.section = Some(Centering::Point);
                }
                "CELL_DATA" => {
                    self.cell_count = Some(self.section_header(&tokens, line, Centering::Cell)?);
                    self.section = Some(Centering::Cell);
                }
                "FIELD" => self.field_block(&tokens, line, &mut raw.arrays)?,
                "SCALARS" => raw.arrays.push(self.scalars(&tokens, line)?),
                "VECTORS" | "NORMALS" => raw.arrays.push(self.vectors(&tokens, line)?),
                "LOOKUP_TABLE" => self.lookup_table(&tokens, line)?,
                "METADATA" => self.cursor.skip_block(),
                other => {
                    return Err(DecodeError::header(
                        line,
                        format!("unsupported keyword '{other}'"),
                    ));
                }
            }
        }
        raw.dimensions = self.dimensions;
        raw.end_line = self.cursor.line();
        Ok(raw)
    }

    fn dimensions_line(&mut self, tokens: &[&str], line: usize) -> DecodeResult<()> {
        let dims = parse_counts(tokens, 3, line)?;
        let (nx, ny, nz) = (dims[0], dims[1], dims[2]);
        match nz {
            0 => return Err(DecodeError::header(line, "DIMENSIONS declares 0 Z lines")),
            1 => {}
            _ => {
                return Err(DecodeError::UnsupportedDataset {
                    what: format!("3D rectilinear grid ({nx}x{ny}x{nz})"),
                });
            }
        }
        if Centering::Point.len(nx, ny).is_none() {
            return Err(DecodeError::header(
                line,
                format!("DIMENSIONS {nx} {ny} overflow the point count"),
            ));
        }
        self.dimensions = Some((nx, ny));
        Ok(())
    }

    fn grid(&self, line: usize, what: &str) -> DecodeResult<(usize, usize)> {
        self.dimensions
            .ok_or_else(|| DecodeError::header(line, format!("{what} before DIMENSIONS")))
    }

    fn values(&mut self, count: usize, data_type: DataType, context: &str) -> DecodeResult<Vec<f64>> {
        match self.encoding {
            Encoding::Ascii => self.cursor.ascii_values(count, context),
            Encoding::Binary => self.cursor.binary_values(count, data_type, context),
        }
    }

    fn coordinates(&mut self, tokens: &[&str], line: usize, axis: Axis) -> DecodeResult<Vec<f64>> {
        let [keyword, count, ty] = tokens else {
            return Err(DecodeError::header(line, "expected '<AXIS>_COORDINATES <n> <type>'"));
        };
        let (nx, ny) = self.grid(line, keyword)?;
        let expected = match axis {
            Axis::X => nx,
            Axis::Y => ny,
            Axis::Z => 1,
        };
        let count = parse_count(count, line)?;
        if count != expected {
            return Err(DecodeError::header(
                line,
                format!("{keyword} has {count} values but DIMENSIONS declares {expected}"),
            ));
        }
        let data_type = DataType::parse(ty, line)?;
        self.values(count, data_type, keyword)
    }

    fn section_header(&self, tokens: &[&str], line: usize, centering: Centering) -> DecodeResult<usize> {
        let count = parse_counts(tokens, 1, line)?[0];
        let (nx, ny) = self.grid(line, tokens[0])?;
        check_shape(tokens[0], centering, nx, ny, count)?;
        Ok(count)
    }

    fn current_section(&self, line: usize, what: &str) -> DecodeResult<Centering> {
        self.section.ok_or_else(|| {
            DecodeError::header(line, format!("{what} before POINT_DATA or CELL_DATA"))
        })
    }

    fn field_block(
        &mut self,
        tokens: &[&str],
        line: usize,
        arrays: &mut Vec<RawArray>,
    ) -> DecodeResult<()> {
        let centering = self.current_section(line, "FIELD")?;
        let [_, _, count] = tokens else {
            return Err(DecodeError::header(line, "expected 'FIELD <name> <count>'"));
        };
        let count = parse_count(count, line)?;
        for _ in 0..count {
            let Some((line, tokens)) = self.cursor.keyword_line()? else {
                return Err(DecodeError::UnexpectedEof {
                    context: "FIELD array header".to_string(),
                });
            };
            if tokens.first().is_some_and(|t| t.eq_ignore_ascii_case("NULL_ARRAY")) {
                continue;
            }
            let [name, components, tuples, ty] = tokens.as_slice() else {
                return Err(DecodeError::header(
                    line,
                    "expected '<name> <components> <tuples> <type>'",
                ));
            };
            let components = parse_count(components, line)?.max(1);
            let tuples = parse_count(tuples, line)?;
            let (nx, ny) = self.grid(line, "FIELD")?;
            check_shape(name, centering, nx, ny, tuples)?;
            let data_type = DataType::parse(ty, line)?;
            let count = value_count(components, tuples, line)?;
            let values = self.values(count, data_type, name)?;
            arrays.push(RawArray {
                name: name.to_string(),
                centering,
                components,
                values,
                line,
            });
            if self
                .cursor
                .peek_keyword()
                .is_some_and(|k| k.eq_ignore_ascii_case("METADATA"))
            {
                self.cursor.keyword_line()?;
                self.cursor.skip_block();
            }
        }
        Ok(())
    }

    fn scalars(&mut self, tokens: &[&str], line: usize) -> DecodeResult<RawArray> {
        let centering = self.current_section(line, "SCALARS")?;
        let (name, ty, components) = match tokens {
            [_, name, ty] => (name, ty, 1),
            [_, name, ty, components] => (name, ty, parse_count(components, line)?.max(1)),
            _ => {
                return Err(DecodeError::header(
                    line,
                    "expected 'SCALARS <name> <type> [components]'",
                ));
            }
        };
        let data_type = DataType::parse(ty, line)?;
        let has_table = match self.encoding {
            Encoding::Ascii => self
                .cursor
                .peek_keyword()
                .is_some_and(|k| k.eq_ignore_ascii_case("LOOKUP_TABLE")),
            // the payload starts right after the newline and may begin with whitespace bytes
            Encoding::Binary => self.cursor.at_keyword("LOOKUP_TABLE"),
        };
        if has_table {
            self.cursor.keyword_line()?;
        }
        let tuples = self.section_count(centering, line)?;
        let count = value_count(components, tuples, line)?;
        let values = self.values(count, data_type, name)?;
        Ok(RawArray {
            name: name.to_string(),
            centering,
            components,
            values,
            line,
        })
    }

    fn vectors(&mut self, tokens: &[&str], line: usize) -> DecodeResult<RawArray> {
        let centering = self.current_section(line, "VECTORS")?;
        let [_, name, ty] = tokens else {
            return Err(DecodeError::header(line, "expected 'VECTORS <name> <type>'"));
        };
        let data_type = DataType::parse(ty, line)?;
        let tuples = self.section_count(centering, line)?;
        let count = value_count(3, tuples, line)?;
        let values = self.values(count, data_type, name)?;
        Ok(RawArray {
            name: name.to_string(),
            centering,
            components: 3,
            values,
            line,
        })
    }

    /// Stand-alone lookup tables carry colours, not field data: read and drop.
    fn lookup_table(&mut self, tokens: &[&str], line: usize) -> DecodeResult<()> {
        let [_, _, size] = tokens else {
            return Err(DecodeError::header(line, "expected 'LOOKUP_TABLE <name> <size>'"));
        };
        let count = value_count(4, parse_count(size, line)?, line)?;
        match self.encoding {
            Encoding::Ascii => self.cursor.ascii_values(count, "LOOKUP_TABLE")?,
            Encoding::Binary => {
                self.cursor
                    .binary_values(count, DataType::UnsignedChar, "LOOKUP_TABLE")?
            }
        };
        Ok(())
    }

    // SCALARS/VECTORS take their tuple count from the enclosing section header
    fn section_count(&self, centering: Centering, line: usize) -> DecodeResult<usize> {
        match centering {
            Centering::Point => self.point_count,
            Centering::Cell => self.cell_count,
        }
        .ok_or_else(|| DecodeError::header(line, "data section without a count"))
    }
}

fn parse_count(token: &str, line: usize) -> DecodeResult<usize> {
    token
        .parse::<usize>()
        .map_err(|_| DecodeError::header(line, format!("'{token}' is not a count")))
}

fn value_count(components: usize, tuples: usize, line: usize) -> DecodeResult<usize> {
    components.checked_mul(tuples).ok_or_else(|| {
        DecodeError::header(line, format!("{components} x {tuples} values overflow"))
    })
}

fn parse_counts(tokens: &[&str], n: usize, line: usize) -> DecodeResult<Vec<usize>> {
    if tokens.len() != n + 1 {
        return Err(DecodeError::header(
            line,
            format!("'{}' expects {n} value(s)", tokens.first().copied().unwrap_or("")),
        ));
    }
    tokens[1..].iter().map(|t| parse_count(t, line)).collect()
}

fn build_snapshot(raw: RawGrid, config: &ReaderConfig) -> DecodeResult<GridSnapshot> {
    let end = raw.end_line;
    let (nx, ny) = raw
        .dimensions
        .ok_or_else(|| DecodeError::header(end, "missing DIMENSIONS"))?;
    let x = raw
        .x
        .ok_or_else(|| DecodeError::header(end, "missing X_COORDINATES"))?;
    let y = raw
        .y
        .ok_or_else(|| DecodeError::header(end, "missing Y_COORDINATES"))?;
    let x_axis = CoordinateAxis::new(Axis::X, x)?;
    let y_axis = CoordinateAxis::new(Axis::Y, y)?;

    let mut point_fields = FieldMap::new();
    let mut cell_fields = FieldMap::new();
    for array in raw.arrays {
        let fields = match array.centering {
            Centering::Point => &mut point_fields,
            Centering::Cell => &mut cell_fields,
        };
        for (name, values) in split_components(&array, config) {
            let shape = check_shape(&name, array.centering, nx, ny, values.len())?;
            let len = values.len();
            let field = Array2::from_shape_vec(shape, values).map_err(|_| {
                sf_core::ValidationError::ShapeMismatch {
                    field: name.clone(),
                    centering: array.centering,
                    expected_rows: shape.0,
                    expected_cols: shape.1,
                    expected_len: len,
                    actual_len: len,
                }
            })?;
            if fields.insert(name.clone(), field).is_some() {
                return Err(DecodeError::header(
                    array.line,
                    format!("duplicate {} array '{name}'", array.centering),
                ));
            }
        }
    }

    Ok(GridSnapshot::new(x_axis, y_axis, point_fields, cell_fields)?)
}

/// De-interleave a multi-component array into one named field per component.
fn split_components(array: &RawArray, config: &ReaderConfig) -> Vec<(String, Vec<f64>)> {
    if array.components == 1 {
        return vec![(array.name.clone(), array.values.clone())];
    }
    (0..array.components)
        .map(|c| {
            let suffix = config
                .component_suffixes
                .get(c)
                .cloned()
                .unwrap_or_else(|| format!("_{c}"));
            let values = array
                .values
                .iter()
                .skip(c)
                .step_by(array.components)
                .copied()
                .collect();
            (format!("{}{}", array.name, suffix), values)
        })
        .collect()
}

/// Write `snapshot` as a legacy VTK file, fields in `FIELD` blocks.
///
/// Doubles throughout; BINARY output is big-endian.
pub fn encode<W: Write>(
    snapshot: &GridSnapshot,
    encoding: Encoding,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out, "{MAGIC} 3.0")?;
    writeln!(out, "snapflow output")?;
    match encoding {
        Encoding::Ascii => writeln!(out, "ASCII")?,
        Encoding::Binary => writeln!(out, "BINARY")?,
    }
    writeln!(out, "DATASET RECTILINEAR_GRID")?;
    let (nx, ny) = (snapshot.nx(), snapshot.ny());
    writeln!(out, "DIMENSIONS {nx} {ny} 1")?;
    write_block(out, encoding, &format!("X_COORDINATES {nx} double"), snapshot.x_axis().values())?;
    write_block(out, encoding, &format!("Y_COORDINATES {ny} double"), snapshot.y_axis().values())?;
    write_block(out, encoding, "Z_COORDINATES 1 double", &[0.0])?;

    for centering in [Centering::Cell, Centering::Point] {
        let fields = snapshot.fields(centering);
        if fields.is_empty() {
            continue;
        }
        // fields of one centering all share the section's value count
        let count = fields.values().next().map_or(0, |field| field.len());
        match centering {
            Centering::Cell => writeln!(out, "CELL_DATA {count}")?,
            Centering::Point => writeln!(out, "POINT_DATA {count}")?,
        }
        writeln!(out, "FIELD FieldData {}", fields.len())?;
        for (name, field) in fields {
            let values: Vec<f64> = field.iter().copied().collect();
            write_block(out, encoding, &format!("{name} 1 {count} double"), &values)?;
        }
    }
    Ok(())
}

fn write_block<W: Write>(
    out: &mut W,
    encoding: Encoding,
    header: &str,
    values: &[f64],
) -> std::io::Result<()> {
    writeln!(out, "{header}")?;
    match encoding {
        Encoding::Ascii => {
            for row in values.chunks(6) {
                let line: Vec<String> = row.iter().map(|v| format!("{v:e}")).collect();
                writeln!(out, "{}", line.join(" "))?;
            }
        }
        Encoding::Binary => {
            for v in values {
                out.write_all(&v.to_be_bytes())?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::ValidationError;

    const CLOVER_ASCII: &str = "# vtk DataFile Version 3.0
vtk output
ASCII
DATASET RECTILINEAR_GRID
DIMENSIONS 4 3 1
X_COORDINATES 4 double
0.0000E+00 0.1000E+01 0.2000E+01 0.3000E+01
Y_COORDINATES 3 double
0.0000E+00 0.5000E+00 0.1000E+01
Z_COORDINATES 1 double
0
CELL_DATA 6
FIELD FieldData 2
density 1 6 double
1 2 3
4 5 6
energy 1 6 double
2.5 2.5 2.5 2.5 2.5 2.5
POINT_DATA 12
FIELD FieldData 2
x_vel 1 12 double
0 1 2 3 4 5 6 7 8 9 10 11
y_vel 1 12 double
0 0 0 0 0 0 0 0 0 0 0 0
";

    fn decode_str(text: &str) -> DecodeResult<GridSnapshot> {
        decode(text.as_bytes(), &ReaderConfig::default())
    }

    #[test]
    fn decodes_clover_style_field_blocks() {
        let snap = decode_str(CLOVER_ASCII).unwrap();
        assert_eq!(snap.nx(), 4);
        assert_eq!(snap.ny(), 3);
        assert_eq!(snap.field_names(Centering::Cell), vec!["density", "energy"]);
        assert_eq!(snap.field_names(Centering::Point), vec!["x_vel", "y_vel"]);

        let density = snap.field(Centering::Cell, "density").unwrap();
        assert_eq!(density.dim(), (2, 3));
        assert_eq!(density[[1, 0]], 4.0);

        // x varies fastest in the file
        let xvel = snap.field(Centering::Point, "x_vel").unwrap();
        assert_eq!(xvel.dim(), (3, 4));
        assert_eq!(xvel[[0, 3]], 3.0);
        assert_eq!(xvel[[2, 1]], 9.0);
    }

    #[test]
    fn scalars_and_vectors_sections() {
        let text = "# vtk DataFile Version 2.0
title
ASCII
DATASET RECTILINEAR_GRID
DIMENSIONS 2 2 1
X_COORDINATES 2 float
0 1
Y_COORDINATES 2 float
0 1
Z_COORDINATES 1 float
0
POINT_DATA 4
SCALARS Pressure float
LOOKUP_TABLE default
1 2 3 4
VECTORS velocity float
1 2 0  3 4 0  5 6 0  7 8 0
";
        let snap = decode_str(text).unwrap();
        assert_eq!(
            snap.field_names(Centering::Point),
            vec!["Pressure", "velocity_x", "velocity_y", "velocity_z"]
        );
        let vy = snap.field(Centering::Point, "velocity_y").unwrap();
        assert_eq!(vy.iter().copied().collect::<Vec<_>>(), vec![2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn binary_round_trip_matches_ascii() {
        let ascii = decode_str(CLOVER_ASCII).unwrap();
        let mut bytes = Vec::new();
        encode(&ascii, Encoding::Binary, &mut bytes).unwrap();
        let binary = decode(&bytes, &ReaderConfig::default()).unwrap();
        assert_eq!(ascii, binary);
    }

    #[test]
    fn wrong_element_count_is_fatal() {
        let text = CLOVER_ASCII.replace("density 1 6 double\n1 2 3\n4 5 6", "density 1 5 double\n1 2 3\n4 5");
        let err = decode_str(&text).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Validation(ValidationError::ShapeMismatch { ref field, actual_len: 5, .. })
                if field == "density"
        ));
    }

    #[test]
    fn section_count_must_match_grid() {
        let text = CLOVER_ASCII.replace("CELL_DATA 6", "CELL_DATA 12");
        assert!(matches!(
            decode_str(&text),
            Err(DecodeError::Validation(ValidationError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn header_problems_are_distinct() {
        assert!(matches!(
            decode_str("hello\n"),
            Err(DecodeError::MalformedHeader { line: 1, .. })
        ));
        assert!(matches!(
            decode_str(&CLOVER_ASCII.replace("ASCII", "XML")),
            Err(DecodeError::MalformedHeader { line: 3, .. })
        ));
        assert!(matches!(
            decode_str(&CLOVER_ASCII.replace("RECTILINEAR_GRID", "STRUCTURED_POINTS")),
            Err(DecodeError::UnsupportedDataset { .. })
        ));
        assert!(matches!(
            decode_str(&CLOVER_ASCII.replace("X_COORDINATES 4 double", "X_COORDINATES 4 bit")),
            Err(DecodeError::UnsupportedDataType { line: 6, .. })
        ));
    }

    #[test]
    fn zero_length_axis_is_degenerate() {
        let text = "# vtk DataFile Version 3.0
t
ASCII
DATASET RECTILINEAR_GRID
DIMENSIONS 0 3 1
X_COORDINATES 0 double
Y_COORDINATES 3 double
0 1 2
";
        assert!(matches!(
            decode_str(text),
            Err(DecodeError::Validation(ValidationError::DegenerateAxis {
                axis: Axis::X,
                len: 0
            }))
        ));
    }

    fn binary_point_scalars(table: bool, payload: &[u8]) -> Vec<u8> {
        let mut bytes = b"# vtk DataFile Version 3.0\nt\nBINARY\nDATASET RECTILINEAR_GRID\n\
DIMENSIONS 2 2 1\nX_COORDINATES 2 unsigned_char\n"
            .to_vec();
        bytes.extend_from_slice(&[0, 1]);
        bytes.extend_from_slice(b"\nY_COORDINATES 2 unsigned_char\n");
        bytes.extend_from_slice(&[0, 1]);
        bytes.extend_from_slice(b"\nZ_COORDINATES 1 unsigned_char\n");
        bytes.push(0);
        bytes.extend_from_slice(b"\nPOINT_DATA 4\nSCALARS flag unsigned_char\n");
        if table {
            bytes.extend_from_slice(b"LOOKUP_TABLE default\n");
        }
        bytes.extend_from_slice(payload);
        bytes.push(b'\n');
        bytes
    }

    #[test]
    fn binary_scalars_may_start_with_whitespace_bytes() {
        for table in [false, true] {
            for payload in [[10u8, 1, 2, 3], [32, 9, 13, 10]] {
                let bytes = binary_point_scalars(table, &payload);
                let snap = decode(&bytes, &ReaderConfig::default()).unwrap();
                let flag = snap.field(Centering::Point, "flag").unwrap();
                let expected: Vec<f64> = payload.iter().map(|&b| f64::from(b)).collect();
                assert_eq!(flag.iter().copied().collect::<Vec<_>>(), expected);
            }
        }
    }

    #[test]
    fn counts_are_checked_against_dimensions() {
        assert!(matches!(
            decode_str(&CLOVER_ASCII.replace("X_COORDINATES 4 double", "X_COORDINATES 5 double")),
            Err(DecodeError::MalformedHeader { line: 6, .. })
        ));
        assert!(matches!(
            decode_str(&CLOVER_ASCII.replace("DIMENSIONS 4 3 1", "DIMENSIONS 4 3 0")),
            Err(DecodeError::MalformedHeader { line: 5, .. })
        ));
        assert!(matches!(
            decode_str(&CLOVER_ASCII.replace("DIMENSIONS 4 3 1", "DIMENSIONS 4 3 2")),
            Err(DecodeError::UnsupportedDataset { .. })
        ));
        assert!(matches!(
            decode_str(&CLOVER_ASCII.replace("DIMENSIONS 4 3 1\n", "")),
            Err(DecodeError::MalformedHeader { line: 5, .. })
        ));
    }

    #[test]
    fn missing_sections_report_the_last_line() {
        let no_dimensions = "# vtk DataFile Version 3.0\nt\nASCII\nDATASET RECTILINEAR_GRID\n";
        assert!(matches!(
            decode_str(no_dimensions),
            Err(DecodeError::MalformedHeader { line: 5, ref reason }) if reason.contains("DIMENSIONS")
        ));

        let no_y = format!("{no_dimensions}DIMENSIONS 2 2 1\nX_COORDINATES 2 double\n0 1\n");
        assert!(matches!(
            decode_str(&no_y),
            Err(DecodeError::MalformedHeader { line: 8, ref reason }) if reason.contains("Y_COORDINATES")
        ));
    }

    #[test]
    fn truncated_data_is_unexpected_eof() {
        let cut = CLOVER_ASCII.find("y_vel 1 12 double").unwrap();
        let text = format!("{}y_vel 1 12 double\n0 0 0\n", &CLOVER_ASCII[..cut]);
        assert!(matches!(
            decode_str(&text),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }
}
