//! Error types for the sf-app service layer.

/// Application error type that wraps errors from the pipeline crates
/// behind one interface for front ends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Aggregation error: {0}")]
    Series(String),

    #[error("Bundle error: {0}")]
    Bundle(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<sf_series::SeriesError> for AppError {
    fn from(err: sf_series::SeriesError) -> Self {
        match err {
            sf_series::SeriesError::Config(message) => AppError::Config(message),
            other => AppError::Series(other.to_string()),
        }
    }
}

impl From<sf_bundle::BundleError> for AppError {
    fn from(err: sf_bundle::BundleError) -> Self {
        AppError::Bundle(err.to_string())
    }
}

impl From<sf_results::ResultsError> for AppError {
    fn from(err: sf_results::ResultsError) -> Self {
        match err {
            sf_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
