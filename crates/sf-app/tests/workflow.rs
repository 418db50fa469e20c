//! End-to-end tests for run processing, caching and progress reporting.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ndarray::Array2;
use sf_app::{
    AppError, RunRequest, WorkflowOptions, WorkflowProgressEvent, WorkflowStage, list_runs,
    load_run, pack_to, process_run, process_run_with_progress,
};
use sf_bundle::{BundleLayer, BundleStore};
use sf_core::{Axis, Centering};
use sf_grid::vtk::{self, Encoding};
use sf_grid::{CoordinateAxis, FieldMap, GridSnapshot};
use sf_results::RunParameters;
use sf_series::{PipelineConfig, ProgressEvent};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn velocity_snapshot(x_vel: f64, y_vel: Option<f64>) -> GridSnapshot {
    let x = CoordinateAxis::new(Axis::X, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
    let y = CoordinateAxis::new(Axis::Y, vec![0.0, 0.5, 1.0]).unwrap();
    let mut points = FieldMap::new();
    points.insert("x_vel".to_string(), Array2::from_elem((3, 4), x_vel));
    if let Some(y_vel) = y_vel {
        points.insert("y_vel".to_string(), Array2::from_elem((3, 4), y_vel));
    }
    let mut cells = FieldMap::new();
    cells.insert("density".to_string(), Array2::from_elem((2, 3), 1.0));
    GridSnapshot::new(x, y, points, cells).unwrap()
}

fn write_snapshot(dir: &Path, step: u64, snapshot: &GridSnapshot) -> PathBuf {
    let mut bytes = Vec::new();
    vtk::encode(snapshot, Encoding::Binary, &mut bytes).unwrap();
    let path = dir.join(format!("clover.00001.{:05}.vtk", step));
    fs::write(&path, bytes).unwrap();
    path
}

const SOLVER_LOG: &str = " Time   0.040000000000000\n                 Volume            Mass         Density        Pressure Internal Energy  Kinetic Energy    Total Energy\n step:      1    0.1000E+03    0.3450E+03    0.3450E+01    0.2047E+03    0.3380E+03    0.0000E+00    0.3380E+03\n";

struct Fixture {
    root: PathBuf,
    data: PathBuf,
    snapshots: Vec<PathBuf>,
    log: PathBuf,
}

fn fixture(prefix: &str) -> Fixture {
    let root = unique_temp_dir(prefix);
    let data = root.join("data");
    fs::create_dir_all(&data).unwrap();
    let snapshots = (1..=3)
        .map(|step| write_snapshot(&data, step, &velocity_snapshot(3.0, Some(4.0))))
        .collect();
    let log = data.join("clover.out");
    fs::write(&log, SOLVER_LOG).unwrap();
    Fixture {
        root,
        data,
        snapshots,
        log,
    }
}

fn parameters() -> RunParameters {
    RunParameters {
        x_cells: Some(3),
        y_cells: Some(2),
        end_step: Some(3),
        visit_frequency: Some(1),
        ..RunParameters::default()
    }
}

fn request<'a>(fixture: &'a Fixture, output: &'a Path, options: WorkflowOptions) -> RunRequest<'a> {
    RunRequest {
        snapshot_dir: &fixture.data,
        log_path: Some(&fixture.log),
        output_dir: output,
        config: PipelineConfig::default(),
        parameters: parameters(),
        simulation_s: Some(1.5),
        options,
    }
}

fn keep_everything() -> WorkflowOptions {
    WorkflowOptions {
        use_cache: true,
        archive: false,
        remove_originals: false,
    }
}

#[test]
fn process_run_archives_and_records() {
    let fixture = fixture("sf_app_process");
    let output = fixture.root.join("out");

    let response = process_run(&request(&fixture, &output, WorkflowOptions::default()))
        .expect("run should succeed");

    assert!(!response.loaded_from_cache);
    assert_eq!(response.summary.timesteps, vec![1, 2, 3]);
    let magnitude = response
        .summary
        .field(Centering::Point, "velocity_magnitude")
        .unwrap();
    assert_eq!(magnitude.overall(), Some((5.0, 5.0, 5.0)));
    assert_eq!(response.summary.energy.as_ref().unwrap()[&1].mass, 345.0);

    let record = &response.record;
    assert_eq!(record.snapshot_count, 3);
    assert_eq!(record.skipped_count, 0);
    assert_eq!(record.timings.simulation_s, Some(1.5));
    assert!(record.timings.total_s >= record.timings.ingestion_s);
    assert_eq!(record.archives.len(), 2);
    assert!(record.archives[0].starts_with("snapshots_"));
    assert!(record.archives[1].starts_with("bundles_"));
    for name in &record.archives {
        assert!(response.run_dir.join(name).is_file());
    }

    // Originals are gone once archived; the solver log stays.
    assert!(fixture.snapshots.iter().all(|p| !p.exists()));
    assert!(fixture.log.exists());
    assert!(BundleStore::new(&response.bundle_dir).list().unwrap().is_empty());

    let (loaded, summary) = load_run(&output, &response.run_id).unwrap();
    assert_eq!(&loaded, record);
    assert_eq!(summary, response.summary);
    let runs = list_runs(&output).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, response.run_id);

    let _ = fs::remove_dir_all(&fixture.root);
}

#[test]
fn second_run_loads_from_cache() {
    let fixture = fixture("sf_app_cache");
    let output = fixture.root.join("out");

    let first = process_run(&request(&fixture, &output, keep_everything())).unwrap();
    assert!(!first.loaded_from_cache);
    assert!(first.record.archives.is_empty());
    assert!(fixture.snapshots.iter().all(|p| p.exists()));

    let bundles = BundleStore::new(&first.bundle_dir);
    assert_eq!(bundles.list().unwrap(), vec![1, 2, 3]);
    let bundle = bundles.load(2).unwrap();
    assert!(bundle.layer(BundleLayer::Magnitude).iter().all(|&v| v == 5.0));

    let second = process_run(&request(&fixture, &output, keep_everything())).unwrap();
    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);
    assert_eq!(second.record, first.record);
    assert_eq!(second.summary, first.summary);

    let forced = process_run(&request(
        &fixture,
        &output,
        WorkflowOptions {
            use_cache: false,
            ..keep_everything()
        },
    ))
    .unwrap();
    assert!(!forced.loaded_from_cache);
    assert_eq!(forced.run_id, first.run_id);
    assert_eq!(forced.summary, first.summary);

    let _ = fs::remove_dir_all(&fixture.root);
}

#[test]
fn progress_stages_are_reported_in_order() {
    let fixture = fixture("sf_app_progress");
    let output = fixture.root.join("out");

    let mut events: Vec<WorkflowProgressEvent> = Vec::new();
    let response = process_run_with_progress(
        &request(&fixture, &output, WorkflowOptions::default()),
        Some(&mut |event| events.push(event)),
    )
    .expect("run with progress should succeed");
    assert!(!response.loaded_from_cache);

    let mut stages: Vec<WorkflowStage> = events.iter().map(|e| e.stage).collect();
    stages.dedup();
    assert_eq!(
        stages,
        vec![
            WorkflowStage::Discovering,
            WorkflowStage::CheckingCache,
            WorkflowStage::Ingesting,
            WorkflowStage::WritingBundles,
            WorkflowStage::ArchivingSnapshots,
            WorkflowStage::ArchivingBundles,
            WorkflowStage::SavingRecord,
            WorkflowStage::Completed,
        ]
    );

    let processed = events
        .iter()
        .filter(|e| matches!(e.series, Some(ProgressEvent::SnapshotProcessed { .. })))
        .count();
    assert_eq!(processed, 3);
    assert!(events.iter().any(|e| matches!(
        e.series,
        Some(ProgressEvent::LogParsed { records: 1, .. })
    )));
    assert!(
        events
            .windows(2)
            .all(|w| w[0].elapsed_wall_s <= w[1].elapsed_wall_s)
    );

    let _ = fs::remove_dir_all(&fixture.root);
}

#[test]
fn failing_snapshot_aborts_without_side_effects() {
    let fixture = fixture("sf_app_fail_fast");
    let bad = write_snapshot(&fixture.data, 4, &velocity_snapshot(3.0, None));
    let output = fixture.root.join("out");

    let err = process_run(&request(&fixture, &output, WorkflowOptions::default())).unwrap_err();
    match err {
        AppError::Series(message) => {
            assert!(message.contains("clover.00001.00004.vtk"), "{message}");
            assert!(message.contains("velocity_magnitude"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(list_runs(&output).unwrap().is_empty());
    assert!(fixture.snapshots.iter().all(|p| p.exists()));
    assert!(bad.exists());

    let _ = fs::remove_dir_all(&fixture.root);
}

#[test]
fn pack_to_writes_named_bundles() {
    let fixture = fixture("sf_app_pack");
    let out = fixture.root.join("bundles");

    let paths = pack_to(&fixture.data, &out, PipelineConfig::default()).unwrap();
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["timestep_0001.npy", "timestep_0002.npy", "timestep_0003.npy"]
    );
    assert_eq!(BundleStore::new(&out).load(3).unwrap().shape(), (3, 4));

    let _ = fs::remove_dir_all(&fixture.root);
}
