//! CLI commands

pub mod compare;
pub mod config;
pub mod models;
pub mod run;
pub mod runs;

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use benchmaker_common::AppConfig;
use benchmaker_domain::{Snapshot, TestSuite};
use benchmaker_infrastructure::{HttpInferenceGateway, JsonSnapshotStore};
use std::sync::Arc;

/// Context passed to all commands
pub struct CommandContext {
    pub config: AppConfig,
    pub format: OutputFormat,
    pub snapshots: JsonSnapshotStore,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(config: AppConfig, format: OutputFormat) -> Self {
        let snapshots = JsonSnapshotStore::new(&config.storage.snapshot_path);
        Self {
            config,
            format,
            snapshots,
        }
    }

    /// HTTP gateway built from the gateway section
    pub fn gateway(&self) -> Result<Arc<HttpInferenceGateway>> {
        let gateway = HttpInferenceGateway::new(&self.config.gateway)
            .context("Failed to create inference gateway")?;
        Ok(Arc::new(gateway))
    }

    /// Fail early when no API key is configured
    pub fn require_api_key(&self) -> Result<()> {
        if self.config.gateway.api_key.is_none() {
            anyhow::bail!(
                "No API key configured. Set OPENROUTER_API_KEY or gateway.api_key in the config file."
            );
        }
        Ok(())
    }
}

/// Suite named by `id`, or the active suite when no id is given
pub(crate) fn lookup_suite<'a>(snapshot: &'a Snapshot, id: Option<&str>) -> Result<&'a TestSuite> {
    let id = match id.or(snapshot.active_test_suite_id.as_deref()) {
        Some(id) => id,
        None => anyhow::bail!("No suite given and no active suite in the snapshot"),
    };
    snapshot
        .suite(id)
        .with_context(|| format!("Suite '{}' not found in the snapshot", id))
}
