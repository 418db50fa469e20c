//! Errors raised while turning a snapshot file into a `GridSnapshot`.

use std::path::PathBuf;

use sf_core::ValidationError;

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("Snapshot file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read snapshot file: {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed header at line {line}: {reason}")]
    MalformedHeader { line: usize, reason: String },

    #[error("Unexpected end of file while reading {context}")]
    UnexpectedEof { context: String },

    #[error("Invalid number '{token}' at line {line} in {context}")]
    InvalidNumber {
        line: usize,
        token: String,
        context: String,
    },

    #[error("Unsupported dataset: {what}")]
    UnsupportedDataset { what: String },

    #[error("Unsupported data type '{name}' at line {line}")]
    UnsupportedDataType { line: usize, name: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl DecodeError {
    pub(crate) fn header(line: usize, reason: impl Into<String>) -> Self {
        DecodeError::MalformedHeader {
            line,
            reason: reason.into(),
        }
    }
}
