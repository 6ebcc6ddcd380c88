//! Error types shared across the engine.
//!
//! Scoring never produces an error; every scoring failure becomes a
//! zero-confidence [`ScoringResult`](crate::scoring::ScoringResult). The types
//! here cover the gateway, the result store and the statistics layer.

use crate::identifiers::RunId;

/// Top-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Inference gateway errors
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Result store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Statistics errors
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Gateway(GatewayError::Cancelled) => "CANCELLED",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Store(StoreError::RunNotFound(_)) => "RUN_NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
            Self::Stats(_) => "STATS_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_retryable(),
            Self::Store(StoreError::Persistence(_)) => true,
            _ => false,
        }
    }
}

/// Convenience result alias
pub type AppResult<T> = Result<T, AppError>;

/// Failures talking to the inference backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// Connection, DNS, TLS or timeout failure
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Non-2xx response
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// The backend answered 2xx with an error payload
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The response could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The gateway cannot be used as configured
    #[error("Gateway misconfigured: {0}")]
    Configuration(String),

    /// A cancellation signal aborted the request
    #[error("Request cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Whether this is the cancellation condition rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Transient failures worth another try at a higher level
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result store failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Unknown run
    #[error("Run not found: {0}")]
    RunNotFound(RunId),

    /// Unknown (test case, model) pair inside a run
    #[error("Result not found in run {run_id}: {test_case_id}@{model_id}")]
    ResultNotFound {
        /// Run id
        run_id: RunId,
        /// Test case id
        test_case_id: String,
        /// Model id
        model_id: String,
    },

    /// The run was sealed and can no longer change
    #[error("Run {0} is sealed")]
    Sealed(RunId),

    /// Reading or writing the backing snapshot failed
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

/// Statistics failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    /// No completed runs were supplied
    #[error("No completed runs to analyze")]
    NoRuns,

    /// Runs from different suites were mixed
    #[error("Runs belong to different suites: expected {expected}, found {found}")]
    MixedSuites {
        /// Suite of the first run
        expected: String,
        /// Offending suite
        found: String,
    },

    /// Too few samples for a two-sample test
    #[error("Not comparable: {model_id} has {samples} sample(s), at least 2 required")]
    InsufficientSamples {
        /// Model lacking samples
        model_id: String,
        /// Samples available
        samples: usize,
    },

    /// Model absent from every run
    #[error("Model not present in any run: {0}")]
    ModelNotFound(String),
}
