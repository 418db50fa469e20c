//! Per-field max/mean/min over time.

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sf_core::{Centering, Real, max_mean_min};
use sf_grid::{DerivedFields, GridSnapshot};

/// Statistics of one field at one timestep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSample {
    pub timestep: u64,
    pub max: Real,
    pub mean: Real,
    pub min: Real,
}

impl FieldSample {
    /// `None` when the field holds only NaN.
    pub fn of(timestep: u64, field: &Array2<Real>) -> Option<Self> {
        let stats = match field.as_slice() {
            Some(values) => max_mean_min(values),
            None => max_mean_min(&field.iter().copied().collect::<Vec<_>>()),
        };
        stats.map(|(max, mean, min)| Self {
            timestep,
            max,
            mean,
            min,
        })
    }
}

/// Time series of one field's statistics. Timesteps where the field was
/// absent are simply not present in `samples`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSeries {
    pub name: String,
    pub centering: Centering,
    pub samples: Vec<FieldSample>,
}

impl FieldSeries {
    pub fn new(name: impl Into<String>, centering: Centering) -> Self {
        Self {
            name: name.into(),
            centering,
            samples: Vec::new(),
        }
    }

    pub fn timesteps(&self) -> Vec<u64> {
        self.samples.iter().map(|s| s.timestep).collect()
    }

    pub fn max_series(&self) -> Vec<Real> {
        self.samples.iter().map(|s| s.max).collect()
    }

    pub fn mean_series(&self) -> Vec<Real> {
        self.samples.iter().map(|s| s.mean).collect()
    }

    pub fn min_series(&self) -> Vec<Real> {
        self.samples.iter().map(|s| s.min).collect()
    }

    /// Largest max, mean of the per-timestep means, smallest min.
    pub fn overall(&self) -> Option<(Real, Real, Real)> {
        if self.samples.is_empty() {
            return None;
        }
        let max = self.samples.iter().map(|s| s.max).fold(Real::NEG_INFINITY, Real::max);
        let min = self.samples.iter().map(|s| s.min).fold(Real::INFINITY, Real::min);
        let mean = self.samples.iter().map(|s| s.mean).sum::<Real>() / self.samples.len() as Real;
        Some((max, mean, min))
    }
}

/// Everything one snapshot contributes to the run summary. Computed
/// independently per file and folded in timestep order afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotStats {
    pub timestep: u64,
    pub samples: BTreeMap<(Centering, String), FieldSample>,
}

impl SnapshotStats {
    /// Statistics of every snapshot field and every derived field.
    pub fn collect(timestep: u64, snapshot: &GridSnapshot, derived: &DerivedFields) -> Self {
        let mut samples = BTreeMap::new();
        for centering in [Centering::Point, Centering::Cell] {
            let fields = snapshot
                .fields(centering)
                .iter()
                .chain(derived.fields(centering));
            for (name, field) in fields {
                if let Some(sample) = FieldSample::of(timestep, field) {
                    samples.insert((centering, name.clone()), sample);
                }
            }
        }
        Self { timestep, samples }
    }

    pub fn get(&self, centering: Centering, name: &str) -> Option<&FieldSample> {
        self.samples.get(&(centering, name.to_string()))
    }
}
