//! Pipeline configuration.
//!
//! Everything that varied between hand-edited script copies lives here:
//! which files to read, how vector arrays are split, which derived fields
//! to compute from which sources, what goes into a bundle, and what to do
//! when a snapshot fails.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sf_bundle::{BundleLayout, TimestepSeriesPacker};
use sf_grid::{DerivationRule, DerivedFieldComputer, GridSnapshotReader, ReaderConfig, VectorMagnitude};

use crate::error::{SeriesError, SeriesResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The first failing snapshot aborts the whole pass.
    #[default]
    FailFast,
    /// Failing snapshots are logged, recorded in the summary and left out.
    SkipAndLog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub snapshot_extension: String,
    pub failure_policy: FailurePolicy,
    /// Decode, derive and pack files on the rayon pool.
    pub parallel: bool,
    pub bundle: BundleLayout,
    /// Applied in order; later rules may read earlier outputs.
    pub derivations: Vec<DerivationRule>,
    pub reader: ReaderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            snapshot_extension: "vtk".to_string(),
            failure_policy: FailurePolicy::default(),
            parallel: false,
            bundle: BundleLayout::default(),
            derivations: vec![DerivationRule::VectorMagnitude(VectorMagnitude::velocity())],
            reader: ReaderConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(text: &str) -> SeriesResult<Self> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| SeriesError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> SeriesResult<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| SeriesError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load(path: &Path) -> SeriesResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| SeriesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    pub fn validate(&self) -> SeriesResult<()> {
        if self.snapshot_extension.trim().is_empty() {
            return Err(SeriesError::Config(
                "snapshot_extension must not be empty".to_string(),
            ));
        }
        if self.snapshot_extension.starts_with('.') {
            return Err(SeriesError::Config(format!(
                "snapshot_extension '{}' must not start with a dot",
                self.snapshot_extension
            )));
        }
        for name in self.bundle.field_names() {
            if name.is_empty() {
                return Err(SeriesError::Config(
                    "bundle layout field names must not be empty".to_string(),
                ));
            }
        }
        for rule in &self.derivations {
            let empty = match rule {
                DerivationRule::VectorMagnitude(r) => {
                    r.output.is_empty()
                        || r.first.candidates().is_empty()
                        || r.second.candidates().is_empty()
                }
                DerivationRule::FirstAvailable(r) => {
                    r.output.is_empty() || r.candidates.candidates().is_empty()
                }
            };
            if empty {
                return Err(SeriesError::Config(format!(
                    "derivation rule {:?} needs an output and at least one source per input",
                    rule
                )));
            }
        }
        Ok(())
    }

    pub fn reader(&self) -> GridSnapshotReader {
        GridSnapshotReader::new(self.reader.clone())
    }

    pub fn computer(&self) -> DerivedFieldComputer {
        DerivedFieldComputer::from_rules(self.derivations.clone())
    }

    pub fn packer(&self) -> TimestepSeriesPacker {
        TimestepSeriesPacker::new(self.bundle.clone())
    }
}
