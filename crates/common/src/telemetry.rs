//! Structured logging setup.

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::TelemetryConfig;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`. Logs go to stderr so command
/// output on stdout stays machine-readable.
///
/// # Examples
///
/// ```no_run
/// use benchmaker_common::telemetry::init_tracing;
///
/// init_tracing("benchmaker", false, "info").expect("Failed to initialize tracing");
/// ```
pub fn init_tracing(service_name: &str, json_format: bool, log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = Registry::default().with(env_filter);

    if json_format {
        registry
            .with(json_layer())
            .try_init()
            .context("Failed to initialize tracing subscriber")?;
    } else {
        registry
            .with(pretty_layer())
            .try_init()
            .context("Failed to initialize tracing subscriber")?;
    }

    tracing::debug!(service = service_name, json = json_format, "Tracing initialized");
    Ok(())
}

/// Initialize tracing from the telemetry section of the configuration
pub fn init_from_config(config: &TelemetryConfig) -> Result<()> {
    init_tracing(&config.service_name, config.json_logging, &config.log_level)
}

fn json_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_level(true)
}

fn pretty_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_span_events(FmtSpan::CLOSE)
}
