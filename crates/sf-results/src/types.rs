//! Run record types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ResultsError, ResultsResult};

pub type RunId = String;

/// Flat key/value form of a record: nested keys are joined with `.`.
pub type FlatRecord = BTreeMap<String, Value>;

/// Inputs the solver was run with, as far as the caller knows them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub x_cells: Option<u64>,
    pub y_cells: Option<u64>,
    pub end_step: Option<u64>,
    pub visit_frequency: Option<u64>,
    /// Physical parameters by name, e.g. `initial_timestep`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub solver: BTreeMap<String, f64>,
}

/// Wall-clock duration of each stage, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    /// Supplied by whoever ran the solver.
    pub simulation_s: Option<f64>,
    /// Discovery, decode, derivation, packing and statistics.
    pub ingestion_s: f64,
    /// Writing bundle files.
    pub packaging_s: f64,
    pub archival_s: f64,
    pub total_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub timestamp: String,
    #[serde(default)]
    pub parameters: RunParameters,
    #[serde(default)]
    pub timings: StageTimings,
    pub snapshot_count: usize,
    pub skipped_count: usize,
    /// Archive file names, relative to the run directory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub archives: Vec<String>,
}

impl RunRecord {
    pub fn to_flat(&self) -> ResultsResult<FlatRecord> {
        let mut flat = FlatRecord::new();
        flatten("", serde_json::to_value(self)?, &mut flat);
        Ok(flat)
    }

    pub fn from_flat(flat: &FlatRecord) -> ResultsResult<Self> {
        let mut root = Map::new();
        for (key, value) in flat {
            insert_path(&mut root, key, value.clone())?;
        }
        Ok(serde_json::from_value(Value::Object(root))?)
    }
}

fn flatten(prefix: &str, value: Value, out: &mut FlatRecord) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child, out);
            }
        }
        Value::Null => {}
        other => {
            out.insert(prefix.to_string(), other);
        }
    }
}

fn insert_path(root: &mut Map<String, Value>, key: &str, value: Value) -> ResultsResult<()> {
    let mut parts = key.split('.').peekable();
    let mut node = root;
    while let Some(part) = parts.next() {
        if part.is_empty() {
            return Err(ResultsError::InvalidRecord {
                message: format!("empty segment in key '{}'", key),
            });
        }
        if parts.peek().is_none() {
            node.insert(part.to_string(), value);
            return Ok(());
        }
        let child = node
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        node = child.as_object_mut().ok_or_else(|| ResultsError::InvalidRecord {
            message: format!("key '{}' conflicts with a scalar at '{}'", key, part),
        })?;
    }
    Ok(())
}
