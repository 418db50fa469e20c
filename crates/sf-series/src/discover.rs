//! Snapshot discovery in timestep order.
//!
//! Directory listing order is never trusted: every file's timestep is
//! parsed from its name and the list is sorted on that integer.

use std::fs;
use std::path::{Path, PathBuf};

use sf_core::{ValidationError, ValidationResult};

use crate::error::{SeriesError, SeriesResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub timestep: u64,
    pub path: PathBuf,
}

/// Timestep embedded in a snapshot file name.
///
/// The token is the run of digits that ends the file stem, which for
/// `clover.00001.00020.vtk` is the last dot-separated segment (`20`) and
/// for `timestep_0042.vtk` is `42`.
pub fn timestep_token(path: &Path) -> ValidationResult<u64> {
    let missing = || ValidationError::MissingTimestepToken {
        path: path.to_path_buf(),
    };
    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(missing)?;
    let digits_start = stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let digits = &stem[digits_start..];
    if digits.is_empty() {
        return Err(missing());
    }
    digits.parse().map_err(|_| missing())
}

/// Every file in `dir` with the given extension, sorted by timestep.
///
/// Two files with the same token are a `ValidationError`; so is a
/// matching file without a token.
pub fn discover_snapshots(dir: &Path, extension: &str) -> SeriesResult<Vec<SnapshotFile>> {
    let io_err = |source| SeriesError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches || !path.is_file() {
            continue;
        }
        let timestep = timestep_token(&path)?;
        files.push(SnapshotFile { timestep, path });
    }

    files.sort_by(|a, b| a.timestep.cmp(&b.timestep).then_with(|| a.path.cmp(&b.path)));

    if let Some(pair) = files.windows(2).find(|w| w[0].timestep == w[1].timestep) {
        return Err(ValidationError::DuplicateTimestep {
            timestep: pair[0].timestep,
            first: pair[0].path.clone(),
            second: pair[1].path.clone(),
        }
        .into());
    }
    Ok(files)
}

/// The highest-timestep snapshot in `dir`, if any.
pub fn last_snapshot(dir: &Path, extension: &str) -> SeriesResult<Option<SnapshotFile>> {
    Ok(discover_snapshots(dir, extension)?.pop())
}
