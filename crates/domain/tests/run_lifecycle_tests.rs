//! Tests for run creation, partial updates and sealing.

use benchmaker_domain::{
    ModelParameters, ResultStatus, ResultUpdate, RunResult, RunStatus, ScoringMethod, TestCase,
    TestSuite, TokenUsage,
};

fn suite(cases: usize) -> TestSuite {
    let mut suite = TestSuite::new("suite-1", "Suite One");
    suite.test_cases = (0..cases)
        .map(|i| TestCase::new(format!("tc-{i}"), format!("prompt {i}"), ScoringMethod::Boolean))
        .collect();
    suite
}

fn models(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("vendor/model-{i}")).collect()
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_new_run_has_one_idle_result_per_pair() {
    let run = RunResult::new(&suite(4), models(3), ModelParameters::default(), None);

    assert_eq!(run.results.len(), 12);
    assert!(run.results.iter().all(|r| r.status == ResultStatus::Idle));
    assert!(run.results.iter().all(|r| r.score.is_none()));
    assert_eq!(run.status, RunStatus::Running);
    assert_eq!(run.test_suite_name, "Suite One");
    assert!(run.completed_at.is_none());
}

#[test]
fn test_every_pair_is_addressable() {
    let run = RunResult::new(&suite(2), models(2), ModelParameters::default(), None);

    for tc in ["tc-0", "tc-1"] {
        for m in ["vendor/model-0", "vendor/model-1"] {
            assert!(run.result(tc, m).is_some(), "missing {tc}@{m}");
        }
    }
    assert!(run.result("tc-9", "vendor/model-0").is_none());
    assert_eq!(run.results_for_model("vendor/model-1").count(), 2);
}

// ============================================================================
// Updates
// ============================================================================

#[test]
fn test_partial_update_leaves_other_fields() {
    let mut run = RunResult::new(&suite(1), models(1), ModelParameters::default(), None);
    let result = run.result_mut("tc-0", "vendor/model-0").unwrap();

    ResultUpdate::streamed("Hel").apply(result);
    ResultUpdate::status(ResultStatus::Running).apply(result);
    assert_eq!(result.streamed_content, "Hel");
    assert_eq!(result.status, ResultStatus::Running);

    ResultUpdate {
        response: Some("Hello".into()),
        status: Some(ResultStatus::Completed),
        latency_ms: Some(120),
        token_counts: Some(TokenUsage::new(10, 2)),
        cost: Some(0.001),
        ..Default::default()
    }
    .apply(result);

    assert_eq!(result.streamed_content, "Hel");
    assert_eq!(result.response, "Hello");
    assert_eq!(result.token_counts.unwrap().total_tokens, 12);
    assert!(result.error.is_none());
}

// ============================================================================
// Sealing
// ============================================================================

#[test]
fn test_seal_never_leaves_running_results() {
    let mut run = RunResult::new(&suite(3), models(1), ModelParameters::default(), None);
    ResultUpdate::status(ResultStatus::Completed).apply(&mut run.results[0]);
    ResultUpdate::status(ResultStatus::Running).apply(&mut run.results[1]);

    run.seal(true);

    assert_eq!(run.status, RunStatus::Completed);
    assert!(run.completed_at.is_some());
    assert!(run.cancelled);
    assert_eq!(run.results[0].status, ResultStatus::Completed);
    assert_eq!(run.results[1].status, ResultStatus::Cancelled);
    assert_eq!(run.results[2].status, ResultStatus::Idle);
    assert!(run.results.iter().all(|r| r.status != ResultStatus::Running));
}

#[test]
fn test_summary_renders_progress_line() {
    let mut run = RunResult::new(&suite(2), models(2), ModelParameters::default(), None);
    ResultUpdate::status(ResultStatus::Completed).apply(&mut run.results[0]);
    ResultUpdate::failed("HTTP 500").apply(&mut run.results[1]);
    run.seal(false);

    let summary = run.summary();
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.idle, 2);
    assert_eq!(summary.to_string(), "1 of 4 completed, 1 failed, cancelled: no");
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_run_serializes_camel_case_with_epoch_millis() {
    let mut run = RunResult::new(&suite(1), models(1), ModelParameters::default(), Some("judge/m".into()));
    run.seal(false);

    let value = serde_json::to_value(&run).unwrap();
    assert!(value["startedAt"].is_i64());
    assert!(value["completedAt"].is_i64());
    assert_eq!(value["testSuiteId"], "suite-1");
    assert_eq!(value["judgeModel"], "judge/m");
    assert_eq!(value["results"][0]["status"], "idle");
    assert_eq!(value["parameters"]["maxTokens"], 1024);

    let back: RunResult = serde_json::from_value(value).unwrap();
    assert_eq!(back.id, run.id);
    assert_eq!(back.results, run.results);
}

// ============================================================================
// Property tests
// ============================================================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn status() -> impl Strategy<Value = ResultStatus> {
        prop_oneof![
            Just(ResultStatus::Idle),
            Just(ResultStatus::Running),
            Just(ResultStatus::Completed),
            Just(ResultStatus::Failed),
            Just(ResultStatus::Cancelled),
        ]
    }

    proptest! {
        #[test]
        fn test_summary_counts_add_up(statuses in prop::collection::vec(status(), 1..24)) {
            let mut run = RunResult::new(&suite(statuses.len()), models(1), ModelParameters::default(), None);
            for (result, status) in run.results.iter_mut().zip(&statuses) {
                result.status = *status;
            }

            let s = run.summary();
            prop_assert_eq!(s.total, statuses.len());
            prop_assert_eq!(s.idle + s.running + s.completed + s.failed + s.cancelled, s.total);
        }

        #[test]
        fn test_benchmark_mode_is_idempotent(
            temperature in 0.0f64..2.0,
            frequency in -2.0f64..2.0,
            presence in -2.0f64..2.0,
            mode in proptest::option::of(any::<bool>()),
        ) {
            let params = ModelParameters {
                temperature,
                frequency_penalty: frequency,
                presence_penalty: presence,
                benchmark_mode: mode,
                ..Default::default()
            };

            let once = params.effective();
            prop_assert_eq!(once.effective(), once.clone());
            if mode == Some(true) {
                prop_assert_eq!(once.temperature, 0.0);
                prop_assert_eq!(once.presence_penalty, 0.0);
            } else {
                prop_assert_eq!(once, params);
            }
        }
    }
}
