//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};

use sf_series::PipelineConfig;

use crate::types::RunParameters;

/// SHA-256 over the run parameters, the pipeline configuration and the
/// snapshot file names, so the same inputs always map to the same run
/// directory.
pub fn compute_run_id(
    parameters: &RunParameters,
    pipeline: &PipelineConfig,
    snapshot_names: &[String],
) -> String {
    let mut hasher = Sha256::new();

    let parameters_json = serde_json::to_string(parameters).unwrap_or_default();
    hasher.update(parameters_json.as_bytes());

    let pipeline_json = serde_json::to_string(pipeline).unwrap_or_default();
    hasher.update(pipeline_json.as_bytes());

    for name in snapshot_names {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn hash_stability() {
        let params = RunParameters {
            x_cells: Some(64),
            y_cells: Some(64),
            ..RunParameters::default()
        };
        let files = names(&["clover.00001.00001.vtk", "clover.00001.00002.vtk"]);

        let hash1 = compute_run_id(&params, &PipelineConfig::default(), &files);
        let hash2 = compute_run_id(&params, &PipelineConfig::default(), &files);

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let params = RunParameters::default();
        let other = RunParameters {
            end_step: Some(500),
            ..RunParameters::default()
        };

        let pipeline = PipelineConfig::default();
        let parallel = PipelineConfig {
            parallel: true,
            ..PipelineConfig::default()
        };
        let files = names(&["a.1.vtk", "a.2.vtk"]);

        let base = compute_run_id(&params, &pipeline, &files);
        assert_ne!(base, compute_run_id(&other, &pipeline, &files));
        assert_ne!(base, compute_run_id(&params, &parallel, &files));
        assert_ne!(base, compute_run_id(&params, &pipeline, &names(&["a.1.vtk"])));
        assert_ne!(
            base,
            compute_run_id(&params, &pipeline, &names(&["a.1.vtka.2.vtk"]))
        );
    }
}
