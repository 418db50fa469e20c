//! Run execution and caching service.
//!
//! Layout of one processed run under `<output_dir>/runs/<run_id>/`:
//! `bundles/timestep_NNNN.npy`, `snapshots_<stamp>.tar.gz`,
//! `bundles_<stamp>.tar.gz`, `summary.json` and `record.json`. The record
//! is written last, so a run directory without one is treated as absent.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use sf_bundle::BundleStore;
use sf_core::StageTimer;
use sf_results::{
    Archiver, RunParameters, RunRecord, RunStore, StageTimings, TarGzArchiver,
    archive_then_remove, compute_run_id,
};
use sf_series::{
    AggregateRequest, PipelineConfig, ProgressEvent, RunSummary, SeriesAggregator,
    discover_snapshots,
};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::progress::{WorkflowProgressEvent, WorkflowStage};

const BUNDLE_DIR: &str = "bundles";

/// Options for processing a run.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub use_cache: bool,
    /// Archive raw snapshots (with the solver log) and the written bundles.
    pub archive: bool,
    /// Delete archived snapshots and bundles once their archive verifies.
    /// The solver log is always kept.
    pub remove_originals: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            archive: true,
            remove_originals: true,
        }
    }
}

/// Request to process one solver run's output.
pub struct RunRequest<'a> {
    pub snapshot_dir: &'a Path,
    pub log_path: Option<&'a Path>,
    pub output_dir: &'a Path,
    pub config: PipelineConfig,
    pub parameters: RunParameters,
    /// Solver wall time, when the caller ran and timed the solver.
    pub simulation_s: Option<f64>,
    pub options: WorkflowOptions,
}

/// Response from processing a run.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub record: RunRecord,
    pub summary: RunSummary,
    pub run_dir: PathBuf,
    pub bundle_dir: PathBuf,
    pub loaded_from_cache: bool,
    pub timing: StageTimings,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(WorkflowProgressEvent)>,
    stage: WorkflowStage,
    started: Instant,
    message: Option<String>,
    series: Option<ProgressEvent>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(WorkflowProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            series,
        });
    }
}

/// Process a run, or load it from the store when already processed.
pub fn process_run(request: &RunRequest) -> AppResult<RunResponse> {
    process_run_with_progress(request, None)
}

/// Process a run and stream stage and per-snapshot progress events.
pub fn process_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(WorkflowProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();

    emit_progress(
        &mut progress_cb,
        WorkflowStage::Discovering,
        started,
        Some(format!("Scanning {}", request.snapshot_dir.display())),
        None,
    );

    let aggregator = SeriesAggregator::new(request.config.clone())?;
    let files = discover_snapshots(request.snapshot_dir, &request.config.snapshot_extension)?;
    if files.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "no .{} snapshots in {}",
            request.config.snapshot_extension,
            request.snapshot_dir.display()
        )));
    }
    let names: Vec<String> = files
        .iter()
        .filter_map(|f| f.path.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect();

    emit_progress(
        &mut progress_cb,
        WorkflowStage::CheckingCache,
        started,
        Some("Checking run cache".to_string()),
        None,
    );

    let run_id = compute_run_id(&request.parameters, &request.config, &names);
    let store = RunStore::for_output(request.output_dir)?;
    let run_dir = store.run_dir(&run_id);
    let bundle_dir = run_dir.join(BUNDLE_DIR);

    if request.options.use_cache && store.has_run(&run_id) {
        emit_progress(
            &mut progress_cb,
            WorkflowStage::LoadingCachedResult,
            started,
            Some("Loading cached run".to_string()),
            None,
        );

        let record = store.load_record(&run_id)?;
        let summary = store.load_summary(&run_id)?;
        info!(run_id = %run_id, "run loaded from cache");

        emit_progress(
            &mut progress_cb,
            WorkflowStage::Completed,
            started,
            Some("Loaded cached run".to_string()),
            None,
        );

        return Ok(RunResponse {
            run_id,
            timing: record.timings.clone(),
            record,
            summary,
            run_dir,
            bundle_dir,
            loaded_from_cache: true,
        });
    }

    // A forced re-run replaces whatever an earlier run left behind.
    store.delete_run(&run_id)?;

    let mut timing = StageTimings {
        simulation_s: request.simulation_s,
        ..StageTimings::default()
    };

    emit_progress(
        &mut progress_cb,
        WorkflowStage::Ingesting,
        started,
        Some(format!("Processing {} snapshots", files.len())),
        None,
    );

    let timer = StageTimer::start("ingestion");
    let aggregate = {
        let mut forward = |event: ProgressEvent| {
            emit_progress(
                &mut progress_cb,
                WorkflowStage::Ingesting,
                started,
                None,
                Some(event),
            );
        };
        let aggregate_request = AggregateRequest {
            snapshot_dir: request.snapshot_dir,
            log_path: request.log_path,
            keep_bundles: true,
        };
        aggregator.run(&aggregate_request, Some(&mut forward))?
    };
    timing.ingestion_s = timer.stop();

    emit_progress(
        &mut progress_cb,
        WorkflowStage::WritingBundles,
        started,
        Some(format!("Writing {} bundles", aggregate.bundles.len())),
        None,
    );

    let timer = StageTimer::start("packaging");
    let bundle_store = BundleStore::new(&bundle_dir);
    let mut bundle_paths = Vec::with_capacity(aggregate.bundles.len());
    for bundle in &aggregate.bundles {
        bundle_paths.push(bundle_store.write(bundle)?);
    }
    timing.packaging_s = timer.stop();

    let mut archives = Vec::new();
    if request.options.archive {
        let timer = StageTimer::start("archival");
        let archiver = TarGzArchiver::default();
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");

        emit_progress(
            &mut progress_cb,
            WorkflowStage::ArchivingSnapshots,
            started,
            Some("Archiving raw snapshots".to_string()),
            None,
        );

        // Skipped snapshots are archived too but stay in place.
        let mut raw_sources: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
        let processed: Vec<PathBuf> = files
            .iter()
            .filter(|f| !aggregate.summary.skipped.iter().any(|s| s.path == f.path))
            .map(|f| f.path.clone())
            .collect();
        match request.log_path {
            Some(log) if log.is_file() => raw_sources.push(log.to_path_buf()),
            Some(log) => warn!(path = %log.display(), "solver log missing, not archived"),
            None => {}
        }
        let remove: &[PathBuf] = if request.options.remove_originals {
            &processed
        } else {
            &[]
        };
        let name = format!("snapshots_{}.{}", stamp, archiver.extension());
        archive_then_remove(&archiver, &raw_sources, remove, &run_dir.join(&name))?;
        archives.push(name);

        if !bundle_paths.is_empty() {
            emit_progress(
                &mut progress_cb,
                WorkflowStage::ArchivingBundles,
                started,
                Some("Archiving bundles".to_string()),
                None,
            );

            let remove: &[PathBuf] = if request.options.remove_originals {
                &bundle_paths
            } else {
                &[]
            };
            let name = format!("bundles_{}.{}", stamp, archiver.extension());
            archive_then_remove(&archiver, &bundle_paths, remove, &run_dir.join(&name))?;
            archives.push(name);
        }
        timing.archival_s = timer.stop();
    }

    emit_progress(
        &mut progress_cb,
        WorkflowStage::SavingRecord,
        started,
        Some("Saving run record".to_string()),
        None,
    );

    timing.total_s = started.elapsed().as_secs_f64();
    let summary = aggregate.summary;
    let record = RunRecord {
        run_id: run_id.clone(),
        timestamp: Utc::now().to_rfc3339(),
        parameters: request.parameters.clone(),
        timings: timing.clone(),
        snapshot_count: summary.timesteps.len(),
        skipped_count: summary.skipped.len(),
        archives,
    };
    store.save_summary(&run_id, &summary)?;
    store.save_record(&record)?;

    info!(
        run_id = %run_id,
        snapshots = record.snapshot_count,
        skipped = record.skipped_count,
        total_s = timing.total_s,
        "run processed"
    );

    emit_progress(
        &mut progress_cb,
        WorkflowStage::Completed,
        started,
        Some("Run completed".to_string()),
        None,
    );

    Ok(RunResponse {
        run_id,
        record,
        summary,
        run_dir,
        bundle_dir,
        loaded_from_cache: false,
        timing,
    })
}

/// Summary of a snapshot directory, without writing anything.
pub fn ingest(
    snapshot_dir: &Path,
    log_path: Option<&Path>,
    config: PipelineConfig,
) -> AppResult<RunSummary> {
    let aggregator = SeriesAggregator::new(config)?;
    Ok(aggregator.ingest_directory(snapshot_dir, log_path)?)
}

/// Pack every snapshot in `snapshot_dir` and write the bundles to
/// `out_dir`. Returns the written paths, ascending by timestep.
///
/// Nothing is written unless every snapshot packs, or the failure policy
/// skips the bad ones.
pub fn pack_to(
    snapshot_dir: &Path,
    out_dir: &Path,
    config: PipelineConfig,
) -> AppResult<Vec<PathBuf>> {
    let aggregator = SeriesAggregator::new(config)?;
    let bundles = aggregator.pack_all(snapshot_dir)?;
    let store = BundleStore::new(out_dir);
    let mut paths = Vec::with_capacity(bundles.len());
    for bundle in &bundles {
        paths.push(store.write(bundle)?);
    }
    info!(dir = %out_dir.display(), bundles = paths.len(), "bundles written");
    Ok(paths)
}

/// Load a stored run's record and summary.
pub fn load_run(output_dir: &Path, run_id: &str) -> AppResult<(RunRecord, RunSummary)> {
    let store = RunStore::for_output(output_dir)?;
    let record = store.load_record(run_id)?;
    let summary = store.load_summary(run_id)?;
    Ok((record, summary))
}

/// Every stored run under `output_dir`, oldest first.
pub fn list_runs(output_dir: &Path) -> AppResult<Vec<RunRecord>> {
    let store = RunStore::for_output(output_dir)?;
    Ok(store.list_runs()?)
}
