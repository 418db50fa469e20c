//! File -> `GridSnapshot`.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DecodeError, DecodeResult};
use crate::snapshot::GridSnapshot;
use crate::vtk;

/// Format variations accepted by the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Suffix appended to an array name for each component of a
    /// multi-component array (`velocity` -> `velocity_x`, ...).
    /// Components past the end of the list get `_<index>`.
    pub component_suffixes: Vec<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            component_suffixes: vec!["_x".to_string(), "_y".to_string(), "_z".to_string()],
        }
    }
}

/// The one decode path for snapshot files.
///
/// Reads every point and cell array in a single pass; performs no writes.
#[derive(Debug, Clone, Default)]
pub struct GridSnapshotReader {
    config: ReaderConfig,
}

impl GridSnapshotReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn read(&self, path: &Path) -> DecodeResult<GridSnapshot> {
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => DecodeError::NotFound {
                path: path.to_path_buf(),
            },
            _ => DecodeError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let snapshot = self.decode(&bytes)?;
        debug!(
            path = %path.display(),
            nx = snapshot.nx(),
            ny = snapshot.ny(),
            point_fields = snapshot.point_fields().len(),
            cell_fields = snapshot.cell_fields().len(),
            "snapshot decoded"
        );
        Ok(snapshot)
    }

    pub fn decode(&self, bytes: &[u8]) -> DecodeResult<GridSnapshot> {
        vtk::decode(bytes, &self.config)
    }
}
