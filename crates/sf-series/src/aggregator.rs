//! Directory of snapshots -> bundles + `RunSummary`.
//!
//! Each file goes through read -> derive -> pack on its own, optionally on
//! the rayon pool. Results are then folded into the summary strictly in
//! timestep order on the calling thread, so the summary never depends on
//! scheduling.

use std::path::Path;

use rayon::prelude::*;
use sf_bundle::{TimestepBundle, TimestepSeriesPacker};
use sf_grid::{DerivedFieldComputer, GridSnapshotReader, Resolution};
use tracing::{debug, info, warn};

use crate::config::{FailurePolicy, PipelineConfig};
use crate::discover::{SnapshotFile, discover_snapshots};
use crate::error::{SeriesError, SeriesResult, SnapshotFailure};
use crate::progress::ProgressEvent;
use crate::solver_log::read_solver_log;
use crate::stats::SnapshotStats;
use crate::summary::{RunSummary, SkippedSnapshot};

/// Inputs of one aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct AggregateRequest<'a> {
    pub snapshot_dir: &'a Path,
    pub log_path: Option<&'a Path>,
    /// Return the packed bundles alongside the summary.
    pub keep_bundles: bool,
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    pub summary: RunSummary,
    /// Empty unless requested; otherwise one per processed timestep, ascending.
    pub bundles: Vec<TimestepBundle>,
}

struct Processed {
    stats: SnapshotStats,
    bundle: TimestepBundle,
    resolutions: Vec<Resolution>,
}

#[derive(Debug)]
pub struct SeriesAggregator {
    config: PipelineConfig,
    reader: GridSnapshotReader,
    computer: DerivedFieldComputer,
    packer: TimestepSeriesPacker,
}

impl Default for SeriesAggregator {
    fn default() -> Self {
        let config = PipelineConfig::default();
        Self {
            reader: config.reader(),
            computer: config.computer(),
            packer: config.packer(),
            config,
        }
    }
}

impl SeriesAggregator {
    pub fn new(config: PipelineConfig) -> SeriesResult<Self> {
        config.validate()?;
        Ok(Self {
            reader: config.reader(),
            computer: config.computer(),
            packer: config.packer(),
            config,
        })
    }

    /// Replace the derivation registry, e.g. one with extra rules registered.
    pub fn with_computer(mut self, computer: DerivedFieldComputer) -> Self {
        self.computer = computer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn computer(&self) -> &DerivedFieldComputer {
        &self.computer
    }

    /// Summary of every snapshot in `dir`, plus the energy table when a
    /// solver log is given.
    pub fn ingest_directory(&self, dir: &Path, log_path: Option<&Path>) -> SeriesResult<RunSummary> {
        let request = AggregateRequest {
            snapshot_dir: dir,
            log_path,
            keep_bundles: false,
        };
        Ok(self.run(&request, None)?.summary)
    }

    /// One bundle per snapshot in `dir`, ascending by timestep.
    pub fn pack_all(&self, dir: &Path) -> SeriesResult<Vec<TimestepBundle>> {
        let request = AggregateRequest {
            snapshot_dir: dir,
            log_path: None,
            keep_bundles: true,
        };
        Ok(self.run(&request, None)?.bundles)
    }

    pub fn run(
        &self,
        request: &AggregateRequest<'_>,
        mut progress_cb: Option<&mut dyn FnMut(ProgressEvent)>,
    ) -> SeriesResult<Aggregate> {
        let mut emit = |event: ProgressEvent| {
            if let Some(cb) = progress_cb.as_deref_mut() {
                cb(event);
            }
        };

        let files = discover_snapshots(request.snapshot_dir, &self.config.snapshot_extension)?;
        info!(
            dir = %request.snapshot_dir.display(),
            snapshots = files.len(),
            "snapshots discovered"
        );
        emit(ProgressEvent::Discovered { total: files.len() });

        // Sequential processing stays lazy so fail-fast stops reading at
        // the first bad file.
        let results: Box<dyn Iterator<Item = Result<Processed, SnapshotFailure>> + '_> =
            if self.config.parallel {
                let done: Vec<_> = files.par_iter().map(|file| self.process(file)).collect();
                Box::new(done.into_iter())
            } else {
                Box::new(files.iter().map(|file| self.process(file)))
            };

        let total = files.len();
        let mut aggregate = Aggregate::default();
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(processed) => {
                    if aggregate.summary.timesteps.is_empty() {
                        log_resolutions(&processed.resolutions);
                    }
                    aggregate.summary.push(processed.stats);
                    if request.keep_bundles {
                        aggregate.bundles.push(processed.bundle);
                    }
                    emit(ProgressEvent::SnapshotProcessed {
                        timestep: file.timestep,
                        completed: aggregate.summary.timesteps.len(),
                        total,
                    });
                }
                Err(source) => match self.config.failure_policy {
                    FailurePolicy::FailFast => {
                        return Err(SeriesError::Snapshot {
                            path: file.path.clone(),
                            timestep: file.timestep,
                            source,
                        });
                    }
                    FailurePolicy::SkipAndLog => {
                        warn!(
                            path = %file.path.display(),
                            timestep = file.timestep,
                            error = %source,
                            "snapshot skipped"
                        );
                        let skipped = SkippedSnapshot {
                            timestep: file.timestep,
                            path: file.path.clone(),
                            reason: source.to_string(),
                        };
                        emit(ProgressEvent::SnapshotSkipped {
                            timestep: skipped.timestep,
                            path: skipped.path.clone(),
                            reason: skipped.reason.clone(),
                        });
                        aggregate.summary.skipped.push(skipped);
                    }
                },
            }
        }

        if let Some(log_path) = request.log_path {
            let log = read_solver_log(log_path);
            emit(ProgressEvent::LogParsed {
                records: log.records.len(),
                errors: log.errors.len(),
            });
            aggregate.summary.energy = Some(log.records);
        }

        info!(
            processed = aggregate.summary.timesteps.len(),
            skipped = aggregate.summary.skipped.len(),
            fields = aggregate.summary.fields.len(),
            "aggregation finished"
        );
        Ok(aggregate)
    }

    fn process(&self, file: &SnapshotFile) -> Result<Processed, SnapshotFailure> {
        let snapshot = self.reader.read(&file.path)?;
        let derived = self.computer.compute(&snapshot);
        let bundle = self.packer.pack(&snapshot, &derived, file.timestep)?;
        let stats = SnapshotStats::collect(file.timestep, &snapshot, &derived);
        let resolutions = self.computer.resolve_computed(&snapshot, &derived);
        debug!(
            path = %file.path.display(),
            timestep = file.timestep,
            derived = derived.len(),
            "snapshot processed"
        );
        Ok(Processed {
            stats,
            bundle,
            resolutions,
        })
    }
}

/// Which source fields each derivation picked, logged for the first processed snapshot.
fn log_resolutions(resolutions: &[Resolution]) {
    for resolution in resolutions {
        info!(
            output = %resolution.output,
            centering = %resolution.centering,
            sources = ?resolution.sources,
            "derived field sources resolved"
        );
    }
}
