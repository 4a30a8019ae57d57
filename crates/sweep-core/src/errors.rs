//! Error types for dataset runs.
//!
//! Everything here is fatal for a run. Predictor failures never surface as a
//! `SweepError`; the per-example runner turns them into error outcomes.

use std::time::Duration;

/// Fatal run and client errors.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// The predictor kind named in configuration has no registered adapter.
    #[error("unsupported predictor kind: {kind}")]
    UnsupportedPredictorKind { kind: String },

    /// No dataset matched the given name or id.
    #[error("dataset not found: {reference}")]
    DatasetNotFound { reference: String },

    /// No example matched the given id.
    #[error("example not found: {id}")]
    ExampleNotFound { id: String },

    /// Both a dataset name and a dataset id were supplied.
    #[error("ambiguous dataset reference: pass either a name ({name}) or an id ({id}), not both")]
    AmbiguousDatasetRef { name: String, id: String },

    /// Neither a dataset name nor a dataset id was supplied.
    #[error("missing dataset reference: a dataset name or id is required")]
    MissingDatasetRef,

    /// Run options outside their valid range.
    #[error("invalid run options: {message}")]
    InvalidOptions { message: String },

    /// Authentication failed or the API key is missing.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Non-success HTTP status from the dataset API.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// Response body did not match the expected shape.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Workers did not exit after their termination markers were sent.
    #[error("workers did not stop within {timeout:?} after the queue drained ({remaining} still running)")]
    JoinTimeout { timeout: Duration, remaining: usize },

    /// A worker task panicked or was cancelled.
    #[error("worker failed: {message}")]
    WorkerPanicked { message: String },

    /// A blocking entry point was called from inside an async runtime.
    #[error("blocking call made from within an async runtime; use the async variant instead")]
    BlockingInsideRuntime,
}

impl SweepError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DatasetNotFound { .. }
            | Self::ExampleNotFound { .. }
            | Self::AmbiguousDatasetRef { .. }
            | Self::MissingDatasetRef
            | Self::InvalidOptions { .. }
            | Self::Config { .. } => 1,

            Self::Unauthorized { .. } => 2,

            Self::UnsupportedPredictorKind { .. } => 3,

            Self::JoinTimeout { .. }
            | Self::WorkerPanicked { .. }
            | Self::BlockingInsideRuntime => 4,

            Self::Http { .. } | Self::Network { .. } | Self::InvalidResponse { .. } => 5,
        }
    }

    /// Whether the error was raised before any work was dispatched.
    pub fn is_preflight(&self) -> bool {
        !matches!(
            self,
            Self::JoinTimeout { .. } | Self::WorkerPanicked { .. }
        )
    }
}

impl From<reqwest::Error> for SweepError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for run and client operations.
pub type SweepResult<T> = Result<T, SweepError>;
