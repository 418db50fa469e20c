//! Run storage API.
//!
//! One directory per run under the store root, holding `record.json`
//! (flat key/value run record), `summary.json` and the run's archives.

use std::fs;
use std::path::{Path, PathBuf};

use sf_series::RunSummary;

use crate::types::{FlatRecord, RunRecord};
use crate::{ResultsError, ResultsResult};

const RECORD_FILE: &str = "record.json";
const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store rooted at `<output_dir>/runs`.
    pub fn for_output(output_dir: &Path) -> ResultsResult<Self> {
        Self::new(output_dir.join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(RECORD_FILE).exists()
    }

    pub fn save_record(&self, record: &RunRecord) -> ResultsResult<()> {
        let run_dir = self.run_dir(&record.run_id);
        fs::create_dir_all(&run_dir)?;
        let json = serde_json::to_string_pretty(&record.to_flat()?)?;
        fs::write(run_dir.join(RECORD_FILE), json)?;
        Ok(())
    }

    pub fn load_record(&self, run_id: &str) -> ResultsResult<RunRecord> {
        let path = self.run_dir(run_id).join(RECORD_FILE);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        let flat: FlatRecord = serde_json::from_str(&content)?;
        RunRecord::from_flat(&flat)
    }

    pub fn save_summary(&self, run_id: &str, summary: &RunSummary) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        fs::create_dir_all(&run_dir)?;
        let json = serde_json::to_string_pretty(summary)?;
        fs::write(run_dir.join(SUMMARY_FILE), json)?;
        Ok(())
    }

    pub fn load_summary(&self, run_id: &str) -> ResultsResult<RunSummary> {
        let path = self.run_dir(run_id).join(SUMMARY_FILE);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Every stored run, oldest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunRecord>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(record) = self.load_record(&run_id) {
                    runs.push(record);
                }
            }
        }

        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.run_id.cmp(&b.run_id)));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
