//! Stored run listing

use anyhow::{Context, Result};
use benchmaker_application::SnapshotStore;
use benchmaker_domain::{RunId, RunResult, RunSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::commands::CommandContext;
use crate::output::{colors, JsonFormatter, TableFormatter};

/// One row of the run listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunListing {
    pub id: RunId,
    pub test_suite_id: String,
    pub test_suite_name: String,
    pub models: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub summary: RunSummary,
}

impl From<&RunResult> for RunListing {
    fn from(run: &RunResult) -> Self {
        Self {
            id: run.id,
            test_suite_id: run.test_suite_id.clone(),
            test_suite_name: run.test_suite_name.clone(),
            models: run.models.clone(),
            started_at: run.started_at,
            summary: run.summary(),
        }
    }
}

/// List stored runs, newest first
pub async fn list(ctx: &CommandContext, suite: Option<String>) -> Result<()> {
    let snapshot = ctx
        .snapshots
        .load()
        .await
        .context("Failed to load snapshot")?;

    let listings = listings(&snapshot.runs, suite.as_deref());

    if ctx.format.is_json() {
        println!("{}", JsonFormatter::format(&listings)?);
        return Ok(());
    }

    if listings.is_empty() {
        println!("{}", colors::warning("No runs stored."));
        return Ok(());
    }

    let headers = vec!["ID", "Suite", "Models", "Started", "Summary"];
    let rows: Vec<Vec<String>> = listings
        .iter()
        .map(|l| {
            let summary = l.summary.to_string();
            vec![
                l.id.to_string(),
                l.test_suite_name.clone(),
                l.models.join(", "),
                l.started_at.format("%Y-%m-%d %H:%M").to_string(),
                if l.summary.was_cancelled || l.summary.failed > 0 {
                    colors::warning(&summary).to_string()
                } else {
                    summary
                },
            ]
        })
        .collect();

    println!("{}", TableFormatter::simple(headers, rows));
    Ok(())
}

fn listings(runs: &[RunResult], suite: Option<&str>) -> Vec<RunListing> {
    let mut listings: Vec<RunListing> = runs
        .iter()
        .filter(|run| suite.map_or(true, |id| run.test_suite_id == id))
        .map(RunListing::from)
        .collect();
    listings.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    listings
}
