//! Directory of per-timestep bundle files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::bundle::{TimestepBundle, bundle_file_name, parse_bundle_file_name};
use crate::error::{BundleError, BundleResult};
use crate::npy;

#[derive(Debug, Clone)]
pub struct BundleStore {
    dir: PathBuf,
}

impl BundleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, timestep: u64) -> PathBuf {
        self.dir.join(bundle_file_name(timestep))
    }

    /// Write one bundle. The data goes to a sibling `.partial` file that
    /// is renamed into place, so a reader never sees a half-written bundle.
    pub fn write(&self, bundle: &TimestepBundle) -> BundleResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| BundleError::io(&self.dir, e))?;

        let path = self.path_for(bundle.timestep());
        let partial = path.with_extension("npy.partial");

        let mut bytes = Vec::new();
        npy::write_array(bundle.data(), &mut bytes).map_err(|e| BundleError::io(&path, e))?;
        if let Err(e) = fs::write(&partial, &bytes) {
            let _ = fs::remove_file(&partial);
            return Err(BundleError::io(&partial, e));
        }
        if let Err(e) = fs::rename(&partial, &path) {
            let _ = fs::remove_file(&partial);
            return Err(BundleError::io(&path, e));
        }

        debug!(
            path = %path.display(),
            timestep = bundle.timestep(),
            bytes = bytes.len(),
            "bundle written"
        );
        Ok(path)
    }

    pub fn load(&self, timestep: u64) -> BundleResult<TimestepBundle> {
        let path = self.path_for(timestep);
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => BundleError::NotFound { timestep },
            _ => BundleError::io(&path, e),
        })?;
        let data = npy::read_array(&bytes).map_err(|source| BundleError::Npy {
            path: path.clone(),
            source,
        })?;
        Ok(TimestepBundle::from_array(timestep, data)?)
    }

    /// Timesteps with a stored bundle, ascending.
    pub fn list(&self) -> BundleResult<Vec<u64>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BundleError::io(&self.dir, e)),
        };

        let mut timesteps = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BundleError::io(&self.dir, e))?;
            if let Some(name) = entry.file_name().to_str()
                && let Some(timestep) = parse_bundle_file_name(name)
            {
                timesteps.push(timestep);
            }
        }
        timesteps.sort_unstable();
        Ok(timesteps)
    }

    /// Paths of every stored bundle, in timestep order.
    pub fn paths(&self) -> BundleResult<Vec<PathBuf>> {
        Ok(self
            .list()?
            .into_iter()
            .map(|t| self.path_for(t))
            .collect())
    }
}
