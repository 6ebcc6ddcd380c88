//! Configuration management.
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/{BENCHMAKER_ENV}.toml` (optional, `BENCHMAKER_ENV` defaults to `development`)
//! 4. An explicit file passed by the caller (optional)
//! 5. Environment variables prefixed `BENCHMAKER__`, e.g. `BENCHMAKER__EXECUTION__MAX_CONCURRENCY=8`
//!
//! `OPENROUTER_API_KEY` is accepted as a fallback for `gateway.api_key`.
//!
//! ## Example
//!
//! ```toml
//! [gateway]
//! base_url = "https://openrouter.ai/api/v1"
//!
//! [execution]
//! max_concurrency = 5
//!
//! [judge]
//! model = "openai/gpt-4o-mini"
//! ```

use anyhow::{Context, Result};
use benchmaker_domain::TestMethod;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub execution: ExecutionConfig,
    pub judge: JudgeConfig,
    pub scoring: ScoringConfig,
    pub statistics: StatisticsConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
}

/// Inference gateway connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,

    /// Bearer token
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Value of the `HTTP-Referer` header
    pub referer: Option<String>,

    /// Value of the `X-Title` header
    pub app_title: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: None,
            timeout_seconds: 120,
            referer: None,
            app_title: Some("Benchmaker".to_string()),
        }
    }
}

/// Run execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Maximum in-flight candidate calls per run
    pub max_concurrency: usize,

    /// Retries after an empty response
    pub max_empty_retries: u32,

    /// Base backoff between empty-response retries, multiplied by the attempt number
    pub empty_retry_base_delay_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            max_empty_retries: 2,
            empty_retry_base_delay_ms: 1000,
        }
    }
}

/// LLM judge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Default judge model; llm-judge cases fall back to boolean scoring without one
    pub model: Option<String>,

    /// Judge sampling temperature
    pub temperature: f64,

    /// Judge completion limit
    pub max_tokens: u32,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.1,
            max_tokens: 1024,
        }
    }
}

/// Deterministic scoring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Absolute tolerance band for numeric-tolerance
    pub numeric_absolute_tolerance: f64,

    /// Relative tolerance band for numeric-tolerance
    pub numeric_relative_tolerance: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            numeric_absolute_tolerance: 0.01,
            numeric_relative_tolerance: 0.01,
        }
    }
}

/// Multi-run statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// p-value threshold for significance
    pub significance_level: f64,

    /// Standard error used by pairwise comparisons
    pub test_method: TestMethod,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            test_method: TestMethod::Pooled,
        }
    }
}

/// Snapshot storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON snapshot file
    pub snapshot_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "benchmaker.json".to_string(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name for tracing
    pub service_name: String,

    /// Enable JSON logging format
    pub json_logging: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "benchmaker".to_string(),
            json_logging: false,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the standard locations and the environment.
    ///
    /// ```no_run
    /// use benchmaker_common::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load configuration");
    /// println!("Running {} tasks at a time", config.execution.max_concurrency);
    /// ```
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an extra, required file layered over the defaults
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let env = std::env::var("BENCHMAKER_ENV").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            // Example: BENCHMAKER__EXECUTION__MAX_CONCURRENCY=8
            .add_source(
                config::Environment::with_prefix("BENCHMAKER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if app_config.gateway.api_key.is_none() {
            app_config.gateway.api_key = std::env::var("OPENROUTER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.gateway.base_url)
            .with_context(|| format!("Invalid gateway base URL '{}'", self.gateway.base_url))?;

        if self.gateway.timeout_seconds == 0 {
            anyhow::bail!("Gateway timeout must be greater than 0");
        }

        if self.execution.max_concurrency == 0 {
            anyhow::bail!("Max concurrency must be greater than 0");
        }

        if self.scoring.numeric_absolute_tolerance < 0.0 || self.scoring.numeric_relative_tolerance < 0.0 {
            anyhow::bail!("Numeric tolerances must not be negative");
        }

        if !(0.0..=2.0).contains(&self.judge.temperature) {
            anyhow::bail!("Judge temperature must be between 0 and 2");
        }

        let alpha = self.statistics.significance_level;
        if !(alpha > 0.0 && alpha < 1.0) {
            anyhow::bail!("Significance level must be in (0, 1), got {}", alpha);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.telemetry.log_level,
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }

    /// Gateway request timeout
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.timeout_seconds)
    }

    /// Retry policy for empty candidate responses
    pub fn empty_response_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(
            self.execution.max_empty_retries,
            Duration::from_millis(self.execution.empty_retry_base_delay_ms),
        )
    }

    /// Copy with the API key masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.gateway.api_key.is_some() {
            config.gateway.api_key = Some("********".to_string());
        }
        config
    }

    /// Configuration for local development
    pub fn development() -> Self {
        Self {
            telemetry: TelemetryConfig {
                log_level: "debug".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
