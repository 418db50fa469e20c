//! Shared application service layer for snapflow.
//!
//! Front ends call into this crate instead of wiring the pipeline crates
//! themselves: it owns the run directory layout, stage timing, bundle
//! writing, archival and run record persistence.

pub mod error;
pub mod progress;
pub mod workflow;

pub use error::{AppError, AppResult};
pub use progress::{WorkflowProgressEvent, WorkflowStage};
pub use workflow::{
    RunRequest, RunResponse, WorkflowOptions, ingest, list_runs, load_run, pack_to, process_run,
    process_run_with_progress,
};
