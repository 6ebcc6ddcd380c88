//! Application layer for the benchmaker engine
//!
//! This crate holds the execution and scoring core. It talks to the outside
//! world only through the [`InferenceGateway`] and [`ResultStore`] traits,
//! which the infrastructure crate implements.
//!
//! ## Modules
//!
//! - `runner` - Concurrency-bounded task runner
//! - `orchestrator` - Runs a suite against a set of models
//! - `scoring` - Deterministic strategies, the LLM judge and the dispatcher
//! - `stats` - Multi-run statistics and pairwise comparison
//! - `gateway`, `store` - Ports to the inference API and result storage

pub mod gateway;
pub mod orchestrator;
pub mod runner;
pub mod scoring;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use gateway::InferenceGateway;
pub use orchestrator::{
    ExecutionOrchestrator, OrchestratorConfig, ProgressEvent, ProgressSink, RunRequest,
};
pub use runner::{RunnerError, RunnerReport, TaskError, TaskFailure, TaskRunner};
pub use scoring::{
    parse_judge_reply, JudgeContext, LlmJudgeScorer, ScoringDispatcher, ScoringStrategy,
};
pub use stats::StatisticalAnalyzer;
pub use store::{ResultStore, SnapshotStore};

use benchmaker_domain::{GatewayError, StatsError, StoreError};
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug, Clone)]
pub enum ApplicationError {
    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Result store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Inference gateway failure
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Statistics failure
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ApplicationError::Gateway(e) => e.is_retryable(),
            ApplicationError::Store(StoreError::Persistence(_)) => true,
            _ => false,
        }
    }

    /// Get error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApplicationError::InvalidInput(_) => "INVALID_INPUT",
            ApplicationError::Store(StoreError::RunNotFound(_)) => "RUN_NOT_FOUND",
            ApplicationError::Store(StoreError::Sealed(_)) => "RUN_SEALED",
            ApplicationError::Store(_) => "STORE_ERROR",
            ApplicationError::Gateway(GatewayError::Cancelled) => "CANCELLED",
            ApplicationError::Gateway(_) => "GATEWAY_ERROR",
            ApplicationError::Stats(_) => "STATS_ERROR",
            ApplicationError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use benchmaker_domain::RunId;

    #[test]
    fn test_error_codes() {
        assert_eq!(ApplicationError::InvalidInput("x".to_string()).error_code(), "INVALID_INPUT");
        assert_eq!(ApplicationError::from(StoreError::RunNotFound(RunId::new())).error_code(), "RUN_NOT_FOUND");
        assert_eq!(ApplicationError::from(GatewayError::Cancelled).error_code(), "CANCELLED");
        assert_eq!(ApplicationError::from(StatsError::NoRuns).error_code(), "STATS_ERROR");
    }

    #[test]
    fn test_error_retryable() {
        assert!(ApplicationError::from(GatewayError::Transport("reset".to_string())).is_retryable());
        assert!(ApplicationError::from(StoreError::Persistence("disk".to_string())).is_retryable());
        assert!(!ApplicationError::InvalidInput("x".to_string()).is_retryable());
        assert!(!ApplicationError::from(GatewayError::Cancelled).is_retryable());
    }
}
