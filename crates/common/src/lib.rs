//! Shared infrastructure for the benchmaker crates.
//!
//! - Configuration management
//! - Structured logging
//! - Retry policies
//! - Cooperative cancellation

pub mod cancellation;
pub mod config;
pub mod retry;
pub mod telemetry;

pub use cancellation::{CancellationToken, Cancelled};
pub use config::{
    AppConfig, ExecutionConfig, GatewayConfig, JudgeConfig, ScoringConfig, StatisticsConfig,
    StorageConfig, TelemetryConfig,
};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use telemetry::{init_from_config, init_tracing};

/// Common error type used throughout the crate
pub type Result<T> = std::result::Result<T, anyhow::Error>;
