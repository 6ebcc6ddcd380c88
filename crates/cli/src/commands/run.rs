//! Run execution commands

use anyhow::{Context, Result};
use benchmaker_application::{
    ExecutionOrchestrator, InferenceGateway, LlmJudgeScorer, OrchestratorConfig, RunRequest,
    ScoringDispatcher, SnapshotStore, StatisticalAnalyzer,
};
use benchmaker_common::CancellationToken;
use benchmaker_domain::{ModelInfo, ModelParameters, ResultStatus, RunResult, Snapshot, TestSuite};
use benchmaker_infrastructure::InMemoryResultStore;
use indicatif::ProgressBar;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::commands::{lookup_suite, CommandContext};
use crate::output::{
    colors, format_cost, format_latency, format_score, JsonFormatter, TableFormatter,
};
use crate::progress::{progress_bar, run_progress, spinner};

/// Options of the `run` command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Suite id in the snapshot
    pub suite: Option<String>,
    /// JSON file holding a suite; stored in the snapshot before running
    pub suite_file: Option<PathBuf>,
    /// Model ids to benchmark
    pub models: Vec<String>,
    /// Judge model for llm-judge cases
    pub judge_model: Option<String>,
    pub benchmark_mode: bool,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Overrides `execution.max_concurrency`
    pub concurrency: Option<usize>,
}

/// Per-model totals of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub model_id: String,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub mean_score: Option<f64>,
    pub total_cost: f64,
    pub avg_latency_ms: Option<f64>,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    run: &'a RunResult,
    models: &'a [ModelSummary],
}

/// Execute a suite against the requested models and store the run
pub async fn execute(ctx: &CommandContext, options: RunOptions) -> Result<()> {
    if options.models.is_empty() {
        anyhow::bail!("At least one --model is required");
    }
    ctx.require_api_key()?;

    let mut snapshot = ctx
        .snapshots
        .load()
        .await
        .context("Failed to load snapshot")?;
    let suite = resolve_suite(&mut snapshot, options.suite.as_deref(), options.suite_file.as_deref()).await?;

    let warnings = suite.validate().into_result().context("Invalid test suite")?;
    for issue in &warnings {
        println!("{} {}", colors::warning("warning:"), issue);
    }

    let gateway = ctx.gateway()?;

    let sp = spinner("Resolving models...");
    let catalog = gateway.fetch_models().await;
    sp.finish_and_clear();
    let catalog = catalog.unwrap_or_else(|e| {
        warn!(error = %e, "Model catalog unavailable, costs will not be tracked");
        Vec::new()
    });
    let (models, unknown) = select_models(&catalog, &options.models);
    for id in &unknown {
        println!("{} model '{}' not in the catalog, cost will be 0", colors::warning("warning:"), id);
    }

    let parameters = build_parameters(&options);
    let judge_model = options.judge_model.clone().or_else(|| ctx.config.judge.model.clone());

    let mut dispatcher = ScoringDispatcher::with_config(&ctx.config.scoring);
    if judge_model.is_some() {
        dispatcher = dispatcher.with_judge(LlmJudgeScorer::with_config(gateway.clone(), &ctx.config.judge));
    }

    let mut config = OrchestratorConfig::from_app_config(&ctx.config);
    if let Some(concurrency) = options.concurrency {
        config.max_concurrency = concurrency.max(1);
    }

    let total = (suite.test_cases.len() * models.len()) as u64;
    let bar = if ctx.format.is_json() {
        ProgressBar::hidden()
    } else {
        progress_bar(total)
    };

    let orchestrator = ExecutionOrchestrator::new(
        gateway,
        Arc::new(InMemoryResultStore::new()),
        Arc::new(dispatcher),
    )
    .with_config(config)
    .with_progress(run_progress(bar.clone()));

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling run");
                cancel.cancel();
            }
        })
    };

    let request = RunRequest {
        suite: suite.clone(),
        models,
        parameters,
        judge_model,
    };
    let outcome = orchestrator.execute_run(request, &cancel).await;
    interrupt.abort();
    bar.finish_and_clear();
    let run = outcome.context("Run failed")?;

    snapshot.active_test_suite_id = Some(suite.id.clone());
    snapshot.upsert_run(run.clone());
    snapshot.touch();
    ctx.snapshots
        .save(&snapshot)
        .await
        .context("Failed to save snapshot")?;
    info!(run_id = %run.id, path = %ctx.snapshots.path().display(), "Run stored");

    let summaries = summarize_models(&run, &suite, &StatisticalAnalyzer::new(&ctx.config.statistics));

    if ctx.format.is_json() {
        let output = RunOutput {
            run: &run,
            models: &summaries,
        };
        println!("{}", JsonFormatter::format(&output)?);
        return Ok(());
    }

    print_summary(&run, &summaries);
    Ok(())
}

fn print_summary(run: &RunResult, summaries: &[ModelSummary]) {
    println!("{}", colors::bold(&format!("Run {} on {}", run.id, run.test_suite_name)));
    println!();

    let headers = vec!["Model", "Completed", "Failed", "Cancelled", "Score", "Cost", "Avg latency"];
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|s| {
            vec![
                s.model_id.clone(),
                s.completed.to_string(),
                s.failed.to_string(),
                s.cancelled.to_string(),
                s.mean_score
                    .map(|score| colors::score(score, &format_score(score)).to_string())
                    .unwrap_or_else(|| "-".to_string()),
                format_cost(s.total_cost),
                s.avg_latency_ms.map(format_latency).unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    println!("{}", TableFormatter::simple(headers, rows));

    let summary = run.summary();
    let line = summary.to_string();
    if summary.was_cancelled {
        println!("{}", colors::warning(&line));
    } else if summary.failed > 0 {
        println!("{}", colors::error(&line));
    } else {
        println!("{}", colors::success(&line));
    }
}

/// Suite to run: a suite file is stored in the snapshot first and takes
/// precedence over an id; with neither, the active suite is used
async fn resolve_suite(snapshot: &mut Snapshot, id: Option<&str>, file: Option<&Path>) -> Result<TestSuite> {
    if let Some(path) = file {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read suite file {}", path.display()))?;
        let suite: TestSuite = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse suite file {}", path.display()))?;
        snapshot.upsert_suite(suite.clone());
        return Ok(suite);
    }
    lookup_suite(snapshot, id).cloned()
}

/// Catalog entries for the requested ids, in request order.
///
/// Ids missing from the catalog are returned unpriced and listed separately.
fn select_models(catalog: &[ModelInfo], requested: &[String]) -> (Vec<ModelInfo>, Vec<String>) {
    let mut unknown = Vec::new();
    let models = requested
        .iter()
        .map(|id| match catalog.iter().find(|m| &m.id == id) {
            Some(model) => model.clone(),
            None => {
                unknown.push(id.clone());
                ModelInfo::unpriced(id.as_str())
            }
        })
        .collect();
    (models, unknown)
}

fn build_parameters(options: &RunOptions) -> ModelParameters {
    let defaults = ModelParameters::default();
    ModelParameters {
        temperature: options.temperature.unwrap_or(defaults.temperature),
        max_tokens: options.max_tokens.unwrap_or(defaults.max_tokens),
        benchmark_mode: options.benchmark_mode.then_some(true),
        ..defaults
    }
}

/// Per-model counts, weighted mean score, cost and latency
pub fn summarize_models(run: &RunResult, suite: &TestSuite, analyzer: &StatisticalAnalyzer) -> Vec<ModelSummary> {
    run.models
        .iter()
        .map(|model_id| {
            let mut summary = ModelSummary {
                model_id: model_id.clone(),
                completed: 0,
                failed: 0,
                cancelled: 0,
                mean_score: analyzer.aggregate_score(run, model_id, suite),
                total_cost: 0.0,
                avg_latency_ms: None,
            };
            let mut latencies = Vec::new();

            for result in run.results_for_model(model_id) {
                match result.status {
                    ResultStatus::Completed => summary.completed += 1,
                    ResultStatus::Failed => summary.failed += 1,
                    ResultStatus::Cancelled => summary.cancelled += 1,
                    ResultStatus::Idle | ResultStatus::Running => {}
                }
                summary.total_cost += result.cost.unwrap_or(0.0);
                latencies.extend(result.latency_ms);
            }

            if !latencies.is_empty() {
                summary.avg_latency_ms = Some(latencies.iter().sum::<u64>() as f64 / latencies.len() as f64);
            }
            summary
        })
        .collect()
}
