//! Multi-run comparison commands

use anyhow::{Context, Result};
use benchmaker_application::{SnapshotStore, StatisticalAnalyzer};
use benchmaker_domain::{ComparisonReport, RunId, RunResult, Snapshot};

use crate::commands::{lookup_suite, CommandContext};
use crate::output::{colors, format_score, JsonFormatter, TableFormatter};

/// Compare models across the stored runs of a suite
pub async fn compare(ctx: &CommandContext, suite: Option<String>, run_ids: Vec<String>) -> Result<()> {
    let snapshot = ctx
        .snapshots
        .load()
        .await
        .context("Failed to load snapshot")?;
    let suite = lookup_suite(&snapshot, suite.as_deref())?;
    let runs = select_runs(&snapshot, &suite.id, &run_ids)?;

    let report = StatisticalAnalyzer::new(&ctx.config.statistics)
        .report(&runs, suite)
        .context("Failed to compare runs")?;

    if ctx.format.is_json() {
        println!("{}", JsonFormatter::format(&report)?);
        return Ok(());
    }

    print_report(&report, &suite.name);
    Ok(())
}

fn print_report(report: &ComparisonReport, suite_name: &str) {
    println!(
        "{}",
        colors::bold(&format!("{}: {} completed runs", suite_name, report.run_ids.len()))
    );
    println!();

    let headers = vec!["Model", "Runs", "Mean", "Std dev", "Min", "Max", "95% CI"];
    let rows: Vec<Vec<String>> = report
        .model_stats
        .iter()
        .map(|s| {
            vec![
                s.model_id.clone(),
                s.samples().to_string(),
                colors::score(s.mean, &format_score(s.mean)).to_string(),
                format!("{:.4}", s.std_dev),
                format_score(s.min),
                format_score(s.max),
                format!("{} - {}", format_score(s.confidence95.0), format_score(s.confidence95.1)),
            ]
        })
        .collect();
    println!("{}", TableFormatter::simple(headers, rows));

    if !report.comparisons.is_empty() {
        let headers = vec!["Model A", "Model B", "Diff", "t", "p", "Effect", "Significant"];
        let rows: Vec<Vec<String>> = report
            .comparisons
            .iter()
            .map(|c| {
                vec![
                    c.model_a.clone(),
                    c.model_b.clone(),
                    format!("{:+.4}", c.score_diff),
                    format!("{:.3}", c.t_statistic),
                    format!("{:.4}", c.p_value),
                    format!("{:.3}", c.effect_size),
                    if c.is_significant {
                        colors::success("yes").to_string()
                    } else {
                        "no".to_string()
                    },
                ]
            })
            .collect();
        println!();
        println!("{}", TableFormatter::simple(headers, rows));
    }

    for skipped in &report.not_comparable {
        println!(
            "{} {} vs {}: {}",
            colors::dim("not comparable:"),
            skipped.model_a,
            skipped.model_b,
            skipped.reason
        );
    }
}

/// Runs of `suite_id`, restricted to `run_ids` when any are given
fn select_runs(snapshot: &Snapshot, suite_id: &str, run_ids: &[String]) -> Result<Vec<RunResult>> {
    if run_ids.is_empty() {
        return Ok(snapshot.runs_for_suite(suite_id).cloned().collect());
    }

    run_ids
        .iter()
        .map(|raw| {
            let id: RunId = raw.parse().with_context(|| format!("Invalid run id '{}'", raw))?;
            let run = snapshot
                .run(&id)
                .with_context(|| format!("Run '{}' not found in the snapshot", raw))?;
            Ok(run.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchmaker_testing::{create_test_suite, create_uniform_suite, RunResultBuilder};

    fn snapshot_with_runs() -> (Snapshot, Vec<RunId>) {
        let mixed = create_test_suite();
        let uniform = create_uniform_suite(2);
        let runs = vec![
            RunResultBuilder::new(&mixed).with_scores("model-a", &[1.0; 4]).build(),
            RunResultBuilder::new(&mixed).with_scores("model-a", &[0.5; 4]).build(),
            RunResultBuilder::new(&uniform).with_scores("model-a", &[1.0, 0.0]).build(),
        ];
        let ids = runs.iter().map(|run| run.id).collect();

        let mut snapshot = Snapshot::default();
        snapshot.upsert_suite(mixed);
        snapshot.upsert_suite(uniform);
        for run in runs {
            snapshot.upsert_run(run);
        }
        (snapshot, ids)
    }

    #[test]
    fn test_select_runs_defaults_to_suite() {
        let (snapshot, ids) = snapshot_with_runs();
        let suite_id = snapshot.run(&ids[0]).unwrap().test_suite_id.clone();

        let runs = select_runs(&snapshot, &suite_id, &[]).unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|run| run.test_suite_id == suite_id));
    }

    #[test]
    fn test_select_runs_by_id() {
        let (snapshot, ids) = snapshot_with_runs();

        let runs = select_runs(&snapshot, "ignored", &[ids[1].to_string()]).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, ids[1]);

        assert!(select_runs(&snapshot, "ignored", &["not-a-uuid".to_string()]).is_err());
        assert!(select_runs(&snapshot, "ignored", &[RunId::new().to_string()]).is_err());
    }

    #[test]
    fn test_explicit_runs_from_other_suite_are_rejected_by_report() {
        let (snapshot, ids) = snapshot_with_runs();
        let mixed = snapshot.run(&ids[0]).unwrap().test_suite_id.clone();
        let suite = snapshot.suite(&mixed).unwrap();

        let runs = select_runs(&snapshot, &mixed, &[ids[0].to_string(), ids[2].to_string()]).unwrap();
        assert!(StatisticalAnalyzer::default().report(&runs, suite).is_err());
    }
}
