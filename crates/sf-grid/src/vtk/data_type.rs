//! Legacy VTK scalar type names and their big-endian binary layout.

use crate::error::{DecodeError, DecodeResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Char,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    Float,
    Double,
}

impl DataType {
    pub fn parse(name: &str, line: usize) -> DecodeResult<Self> {
        let ty = match name.to_ascii_lowercase().as_str() {
            "char" | "vtktypeint8" => DataType::Char,
            "unsigned_char" | "vtktypeuint8" => DataType::UnsignedChar,
            "short" | "vtktypeint16" => DataType::Short,
            "unsigned_short" | "vtktypeuint16" => DataType::UnsignedShort,
            "int" | "vtktypeint32" => DataType::Int,
            "unsigned_int" | "vtktypeuint32" => DataType::UnsignedInt,
            "long" | "vtktypeint64" => DataType::Long,
            "unsigned_long" | "vtktypeuint64" => DataType::UnsignedLong,
            "float" | "vtktypefloat32" => DataType::Float,
            "double" | "vtktypefloat64" => DataType::Double,
            _ => {
                return Err(DecodeError::UnsupportedDataType {
                    line,
                    name: name.to_string(),
                });
            }
        };
        Ok(ty)
    }

    /// Width in bytes of one value in a BINARY file.
    pub fn size(self) -> usize {
        match self {
            DataType::Char | DataType::UnsignedChar => 1,
            DataType::Short | DataType::UnsignedShort => 2,
            DataType::Int | DataType::UnsignedInt | DataType::Float => 4,
            DataType::Long | DataType::UnsignedLong | DataType::Double => 8,
        }
    }

    /// Decode one big-endian value. `chunk.len()` must equal `self.size()`.
    pub fn read_be(self, chunk: &[u8]) -> f64 {
        match self {
            DataType::Char => i8::from_be_bytes(bytes(chunk)) as f64,
            DataType::UnsignedChar => u8::from_be_bytes(bytes(chunk)) as f64,
            DataType::Short => i16::from_be_bytes(bytes(chunk)) as f64,
            DataType::UnsignedShort => u16::from_be_bytes(bytes(chunk)) as f64,
            DataType::Int => i32::from_be_bytes(bytes(chunk)) as f64,
            DataType::UnsignedInt => u32::from_be_bytes(bytes(chunk)) as f64,
            DataType::Long => i64::from_be_bytes(bytes(chunk)) as f64,
            DataType::UnsignedLong => u64::from_be_bytes(bytes(chunk)) as f64,
            DataType::Float => f32::from_be_bytes(bytes(chunk)) as f64,
            DataType::Double => f64::from_be_bytes(bytes(chunk)),
        }
    }
}

fn bytes<const N: usize>(chunk: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&chunk[..N]);
    out
}
