//! Minimal NumPy `.npy` codec for 3-D `f64` arrays.
//!
//! Writes format version 1.0, `<f8`, C order, header padded to a multiple
//! of 64 bytes. Reads versions 1.x to 3.x with `<f8` or `>f8` data in
//! either C or Fortran order.

use std::io::{self, Write};

use ndarray::{Array3, ShapeBuilder};

use crate::error::{NpyError, NpyResult};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;

pub fn write_array<W: Write>(array: &Array3<f64>, mut out: W) -> io::Result<()> {
    let (a, b, c) = array.dim();
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}, {}), }}",
        a, b, c
    );
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    let pad = (ALIGN - unpadded % ALIGN) % ALIGN;
    header.extend(std::iter::repeat_n(' ', pad));
    header.push('\n');
    let header_len = u16::try_from(header.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "npy header too long"))?;

    out.write_all(MAGIC)?;
    out.write_all(&[1, 0])?;
    out.write_all(&header_len.to_le_bytes())?;
    out.write_all(header.as_bytes())?;

    let mut body = Vec::with_capacity(array.len() * 8);
    for value in array.iter() {
        body.extend_from_slice(&value.to_le_bytes());
    }
    out.write_all(&body)
}

pub fn read_array(bytes: &[u8]) -> NpyResult<Array3<f64>> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(NpyError::BadMagic);
    }
    let (header_len, header_start): (usize, usize) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(NpyError::Truncated {
                    expected: 12,
                    actual: bytes.len(),
                });
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        version => return Err(NpyError::UnsupportedVersion(version)),
    };
    let header_end = header_start.saturating_add(header_len);
    if bytes.len() < header_end {
        return Err(NpyError::Truncated {
            expected: header_end,
            actual: bytes.len(),
        });
    }
    let text = std::str::from_utf8(&bytes[header_start..header_end])
        .map_err(|_| NpyError::BadHeader("header is not valid text".to_string()))?;
    let header = Header::parse(text)?;

    let &[a, b, c] = header.shape.as_slice() else {
        return Err(NpyError::Dimensions {
            expected: 3,
            actual: header.shape.len(),
        });
    };
    let expected = a
        .checked_mul(b)
        .and_then(|n| n.checked_mul(c))
        .and_then(|n| n.checked_mul(8))
        .ok_or_else(|| NpyError::BadHeader(format!("shape ({a}, {b}, {c}) is too large")))?;
    let body = &bytes[header_end..];
    if body.len() != expected {
        return Err(NpyError::Truncated {
            expected: header_end.saturating_add(expected),
            actual: bytes.len(),
        });
    }

    let values: Vec<f64> = body
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            if header.little_endian {
                f64::from_le_bytes(raw)
            } else {
                f64::from_be_bytes(raw)
            }
        })
        .collect();

    let shape = (a, b, c);
    let array = if header.fortran_order {
        Array3::from_shape_vec(shape.f(), values)
    } else {
        Array3::from_shape_vec(shape, values)
    };
    array.map_err(|e| NpyError::BadHeader(e.to_string()))
}

struct Header {
    little_endian: bool,
    fortran_order: bool,
    shape: Vec<usize>,
}

impl Header {
    fn parse(text: &str) -> NpyResult<Self> {
        let descr = quoted(value_after(text, "descr")?)?;
        let little_endian = match descr {
            "<f8" | "f8" | "float64" => true,
            ">f8" => false,
            other => return Err(NpyError::UnsupportedDtype(other.to_string())),
        };

        let order = value_after(text, "fortran_order")?;
        let fortran_order = if order.starts_with("True") {
            true
        } else if order.starts_with("False") {
            false
        } else {
            return Err(NpyError::BadHeader("fortran_order is not a bool".to_string()));
        };

        let shape_text = value_after(text, "shape")?;
        let inner = shape_text
            .strip_prefix('(')
            .and_then(|rest| rest.split_once(')'))
            .map(|(inner, _)| inner)
            .ok_or_else(|| NpyError::BadHeader("shape is not a tuple".to_string()))?;
        let shape = inner
            .split(',')
            .map(str::trim)
            .filter(|dim| !dim.is_empty())
            .map(|dim| {
                dim.parse::<usize>()
                    .map_err(|_| NpyError::BadHeader(format!("bad dimension '{}'", dim)))
            })
            .collect::<NpyResult<Vec<_>>>()?;

        Ok(Self {
            little_endian,
            fortran_order,
            shape,
        })
    }
}

/// Text following `'key':` in the header dict.
fn value_after<'a>(text: &'a str, key: &str) -> NpyResult<&'a str> {
    let needle = format!("'{}'", key);
    let start = text
        .find(&needle)
        .ok_or_else(|| NpyError::BadHeader(format!("missing key '{}'", key)))?;
    text[start + needle.len()..]
        .trim_start()
        .strip_prefix(':')
        .map(str::trim_start)
        .ok_or_else(|| NpyError::BadHeader(format!("no value for '{}'", key)))
}

fn quoted(text: &str) -> NpyResult<&str> {
    let quote = text
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| NpyError::BadHeader("expected a quoted string".to_string()))?;
    text[1..]
        .split_once(quote)
        .map(|(inner, _)| inner)
        .ok_or_else(|| NpyError::BadHeader("unterminated string".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(array: &Array3<f64>) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_array(array, &mut bytes).unwrap();
        bytes
    }

    #[test]
    fn header_is_aligned_and_readable() {
        let array = Array3::from_shape_fn((5, 3, 4), |(l, j, i)| (l * 100 + j * 10 + i) as f64);
        let bytes = encoded(&array);

        assert_eq!(&bytes[..6], MAGIC);
        assert_eq!(bytes[6..8], [1, 0]);
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!((10 + header_len) % ALIGN, 0);
        let header = std::str::from_utf8(&bytes[10..10 + header_len]).unwrap();
        assert!(header.starts_with("{'descr': '<f8', 'fortran_order': False, 'shape': (5, 3, 4), }"));
        assert!(header.ends_with('\n'));
        assert_eq!(bytes.len(), 10 + header_len + 60 * 8);

        assert_eq!(read_array(&bytes).unwrap(), array);
    }

    #[test]
    fn reads_fortran_order_big_endian() {
        let header = "{'descr': '>f8', 'fortran_order': True, 'shape': (1, 2, 3), }\n";
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        // Column-major: [0,0,0] [0,1,0] [0,0,1] [0,1,1] [0,0,2] [0,1,2]
        for v in [0.0f64, 10.0, 1.0, 11.0, 2.0, 12.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }

        let array = read_array(&bytes).unwrap();
        assert_eq!(array[[0, 0, 2]], 2.0);
        assert_eq!(array[[0, 1, 0]], 10.0);
        assert_eq!(array[[0, 1, 2]], 12.0);
    }

    fn with_header(header: &str) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes
    }

    #[test]
    fn oversized_shape_is_a_bad_header() {
        let bytes = with_header(
            "{'descr': '<f8', 'fortran_order': False, 'shape': (4294967296, 4294967296, 5), }\n",
        );
        assert!(matches!(read_array(&bytes), Err(NpyError::BadHeader(ref m)) if m.contains("too large")));

        let mut bytes = with_header(&format!(
            "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, 1, 1), }}\n",
            usize::MAX / 8 + 1
        ));
        bytes.extend_from_slice(&[0; 8]);
        assert!(matches!(read_array(&bytes), Err(NpyError::BadHeader(_))));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(read_array(b"PK\x03\x04"), Err(NpyError::BadMagic));

        let mut bytes = encoded(&Array3::zeros((5, 2, 2)));
        bytes.truncate(bytes.len() - 8);
        assert!(matches!(read_array(&bytes), Err(NpyError::Truncated { .. })));

        let header = "{'descr': '<i4', 'fortran_order': False, 'shape': (1, 1, 1), }\n";
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        assert_eq!(
            read_array(&bytes),
            Err(NpyError::UnsupportedDtype("<i4".to_string()))
        );

        let header = "{'descr': '<f8', 'fortran_order': False, 'shape': (4,), }\n";
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        assert_eq!(
            read_array(&bytes),
            Err(NpyError::Dimensions {
                expected: 3,
                actual: 1
            })
        );
    }
}
