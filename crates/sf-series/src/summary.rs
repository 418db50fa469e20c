//! Run-level summary folded from per-snapshot statistics.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sf_core::Centering;

use crate::solver_log::EnergyRecord;
use crate::stats::{FieldSeries, SnapshotStats};

/// A snapshot left out under the skip-and-log policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSnapshot {
    pub timestep: u64,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Timesteps actually processed, ascending.
    pub timesteps: Vec<u64>,
    /// One series per field seen in the first processed snapshot.
    pub fields: Vec<FieldSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<BTreeMap<u64, EnergyRecord>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedSnapshot>,
}

impl RunSummary {
    /// Fold one snapshot's statistics in. Must be called in timestep order.
    ///
    /// The first call fixes the set of tracked fields. Later snapshots
    /// missing a tracked field leave a gap in that series; fields that
    /// only appear later are not tracked.
    pub fn push(&mut self, stats: SnapshotStats) {
        if self.timesteps.is_empty() {
            self.fields = stats
                .samples
                .keys()
                .map(|(centering, name)| FieldSeries::new(name.clone(), *centering))
                .collect();
        }
        for series in &mut self.fields {
            if let Some(sample) = stats.get(series.centering, &series.name) {
                series.samples.push(*sample);
            }
        }
        self.timesteps.push(stats.timestep);
    }

    pub fn field(&self, centering: Centering, name: &str) -> Option<&FieldSeries> {
        self.fields
            .iter()
            .find(|s| s.centering == centering && s.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.timesteps.is_empty()
    }
}
