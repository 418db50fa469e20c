use std::path::PathBuf;

/// Progress reported by [`crate::SeriesAggregator::run`].
///
/// Events are emitted from the calling thread in timestep order, also
/// when files are processed in parallel.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Discovered {
        total: usize,
    },
    SnapshotProcessed {
        timestep: u64,
        completed: usize,
        total: usize,
    },
    SnapshotSkipped {
        timestep: u64,
        path: PathBuf,
        reason: String,
    },
    LogParsed {
        records: usize,
        errors: usize,
    },
}
