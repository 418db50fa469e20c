use sf_series::ProgressEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Discovering,
    CheckingCache,
    LoadingCachedResult,
    Ingesting,
    WritingBundles,
    ArchivingSnapshots,
    ArchivingBundles,
    SavingRecord,
    Completed,
}

impl WorkflowStage {
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStage::Discovering => "Discovering snapshots",
            WorkflowStage::CheckingCache => "Checking cache",
            WorkflowStage::LoadingCachedResult => "Loading cached run",
            WorkflowStage::Ingesting => "Ingesting",
            WorkflowStage::WritingBundles => "Writing bundles",
            WorkflowStage::ArchivingSnapshots => "Archiving snapshots",
            WorkflowStage::ArchivingBundles => "Archiving bundles",
            WorkflowStage::SavingRecord => "Saving record",
            WorkflowStage::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowProgressEvent {
    pub stage: WorkflowStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    /// Per-snapshot detail, only during `Ingesting`.
    pub series: Option<ProgressEvent>,
}
