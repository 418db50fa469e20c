//! sf-series: turn a directory of snapshots into bundles and a run summary.
//!
//! Contains:
//! - discover (timestep tokens and ordered snapshot discovery)
//! - stats (per-field max/mean/min series)
//! - solver_log (energy table parsed from the solver's text output)
//! - summary (`RunSummary`)
//! - config (`PipelineConfig`, failure policy)
//! - aggregator (`SeriesAggregator`)

pub mod aggregator;
pub mod config;
pub mod discover;
pub mod error;
pub mod progress;
pub mod solver_log;
pub mod stats;
pub mod summary;

pub use aggregator::{Aggregate, AggregateRequest, SeriesAggregator};
pub use config::{FailurePolicy, PipelineConfig};
pub use discover::{SnapshotFile, discover_snapshots, last_snapshot, timestep_token};
pub use error::{LogParseError, SeriesError, SeriesResult, SnapshotFailure};
pub use progress::ProgressEvent;
pub use solver_log::{EnergyRecord, SolverLog, parse_solver_log, read_solver_log};
pub use stats::{FieldSample, FieldSeries, SnapshotStats};
pub use summary::{RunSummary, SkippedSnapshot};
