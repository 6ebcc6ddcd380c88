//! Configuration display

use anyhow::Result;

use crate::commands::CommandContext;
use crate::output::{JsonFormatter, TableFormatter};

/// Print the effective configuration with the API key masked
pub fn show(ctx: &CommandContext) -> Result<()> {
    let config = ctx.config.redacted();

    if ctx.format.is_json() {
        println!("{}", JsonFormatter::format(&config)?);
        return Ok(());
    }

    let items = vec![
        ("Gateway URL", config.gateway.base_url.clone()),
        ("API key", config.gateway.api_key.clone().unwrap_or_else(|| "(not set)".to_string())),
        ("Timeout", format!("{}s", config.gateway.timeout_seconds)),
        ("Concurrency", config.execution.max_concurrency.to_string()),
        (
            "Empty retries",
            format!(
                "{} (base delay {}ms)",
                config.execution.max_empty_retries, config.execution.empty_retry_base_delay_ms
            ),
        ),
        ("Judge model", config.judge.model.clone().unwrap_or_else(|| "(none)".to_string())),
        ("Judge temperature", config.judge.temperature.to_string()),
        (
            "Numeric tolerance",
            format!(
                "abs {} / rel {}",
                config.scoring.numeric_absolute_tolerance, config.scoring.numeric_relative_tolerance
            ),
        ),
        ("Significance level", config.statistics.significance_level.to_string()),
        ("Test method", format!("{:?}", config.statistics.test_method).to_lowercase()),
        ("Snapshot", config.storage.snapshot_path.clone()),
        ("Log level", config.telemetry.log_level.clone()),
    ];

    println!("{}", TableFormatter::key_value(items));
    Ok(())
}
