//! Archival of run artifacts.
//!
//! Files are stored flat, under their own file names. Originals are only
//! removed once the written archive has been reopened and its entry list
//! matches what was put in.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::{debug, info};

use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReceipt {
    pub path: PathBuf,
    pub entries: Vec<String>,
    pub bytes: u64,
}

pub trait Archiver {
    /// File extension of produced archives, without the leading dot.
    fn extension(&self) -> &'static str;

    /// Bundle `sources` into a new archive at `dest`.
    fn archive(&self, sources: &[PathBuf], dest: &Path) -> ResultsResult<ArchiveReceipt>;

    /// Entry names of an existing archive.
    fn list_entries(&self, archive: &Path) -> ResultsResult<Vec<String>>;
}

/// `.tar.gz` archives.
#[derive(Debug, Clone, Copy)]
pub struct TarGzArchiver {
    level: Compression,
}

impl Default for TarGzArchiver {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl TarGzArchiver {
    /// Compression level 0 (store) to 9 (best).
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

fn entry_name(path: &Path) -> ResultsResult<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| ResultsError::InvalidPath {
            message: format!("{} has no usable file name", path.display()),
        })
}

impl Archiver for TarGzArchiver {
    fn extension(&self) -> &'static str {
        "tar.gz"
    }

    fn archive(&self, sources: &[PathBuf], dest: &Path) -> ResultsResult<ArchiveReceipt> {
        let mut entries = Vec::with_capacity(sources.len());
        let mut seen = BTreeSet::new();
        for source in sources {
            let name = entry_name(source)?;
            if !seen.insert(name.clone()) {
                return Err(ResultsError::InvalidPath {
                    message: format!("two sources named '{}'", name),
                });
            }
            entries.push(name);
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let partial = dest.with_extension("partial");
        let written = (|| -> ResultsResult<()> {
            let file = File::create(&partial)?;
            let mut builder = tar::Builder::new(GzEncoder::new(file, self.level));
            for (source, name) in sources.iter().zip(&entries) {
                builder.append_path_with_name(source, name)?;
            }
            builder.into_inner()?.finish()?.sync_all()?;
            Ok(())
        })();
        if let Err(e) = written {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, dest)?;

        let bytes = fs::metadata(dest)?.len();
        debug!(path = %dest.display(), entries = entries.len(), bytes, "archive written");
        Ok(ArchiveReceipt {
            path: dest.to_path_buf(),
            entries,
            bytes,
        })
    }

    fn list_entries(&self, archive: &Path) -> ResultsResult<Vec<String>> {
        let mut reader = tar::Archive::new(GzDecoder::new(File::open(archive)?));
        let mut names = Vec::new();
        for entry in reader.entries()? {
            let entry = entry?;
            names.push(entry.path()?.to_string_lossy().to_string());
        }
        Ok(names)
    }
}

/// Archive `sources` into `dest`, verify the archive, then delete the
/// files listed in `remove` (each of which must be among `sources`).
///
/// Nothing is deleted if writing or verification fails.
pub fn archive_then_remove(
    archiver: &dyn Archiver,
    sources: &[PathBuf],
    remove: &[PathBuf],
    dest: &Path,
) -> ResultsResult<ArchiveReceipt> {
    if let Some(stray) = remove.iter().find(|p| !sources.contains(*p)) {
        return Err(ResultsError::InvalidPath {
            message: format!("{} is not part of the archive", stray.display()),
        });
    }

    let receipt = archiver.archive(sources, dest)?;

    let stored: BTreeSet<String> = archiver.list_entries(&receipt.path)?.into_iter().collect();
    let expected: BTreeSet<String> = receipt.entries.iter().cloned().collect();
    if stored.len() != sources.len() || stored != expected {
        return Err(ResultsError::ArchiveVerification {
            path: receipt.path.clone(),
            message: format!(
                "expected {} entries, archive holds {}",
                expected.len(),
                stored.len()
            ),
        });
    }

    for path in remove {
        fs::remove_file(path)?;
    }
    info!(
        path = %receipt.path.display(),
        archived = receipt.entries.len(),
        removed = remove.len(),
        "archive verified"
    );
    Ok(receipt)
}
