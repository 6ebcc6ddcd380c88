//! Tests for scoring strategies, the judge scorer and the dispatcher
//!
//! Covers the documented examples, judge fallbacks and score-range properties.

use benchmaker_application::scoring::{
    judge::{JUDGE_RUBRIC, JSON_CONFIDENCE},
    BooleanStrategy, ExactMatchStrategy, NumericToleranceStrategy, RegexMatchStrategy,
};
use benchmaker_application::{
    parse_judge_reply, JudgeContext, LlmJudgeScorer, ScoringDispatcher, ScoringStrategy,
};
use benchmaker_common::{CancellationToken, JudgeConfig};
use benchmaker_domain::{ChatRole, GatewayError, ScoringMethod};
use benchmaker_testing::*;
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Deterministic strategies
// ============================================================================

#[test]
fn test_exact_match_examples() {
    let s = ExactMatchStrategy;
    assert_eq!(s.score("Paris", "Paris").score, 1.0);
    assert_eq!(s.score("paris", "Paris").score, 0.95);

    let contained = s.score("The answer is Paris.", "Paris").score;
    assert!((0.6..0.95).contains(&contained));
}

#[test]
fn test_regex_examples() {
    let s = RegexMatchStrategy;
    assert_eq!(s.score("cat123", r"/\d+/").score, 1.0);
    assert_eq!(s.score("cat", r"/\d+/").score, 0.0);

    let invalid = s.score("cat", "/([/");
    assert_eq!(invalid.score, 0.0);
    assert_eq!(invalid.confidence, Some(0.0));
}

#[test]
fn test_numeric_examples() {
    assert_eq!(NumericToleranceStrategy::default().score("42", "42").score, 1.0);

    let partial = NumericToleranceStrategy::new(0.1, 0.01).score("roughly 45", "42");
    assert!(partial.score > 0.0 && partial.score < 1.0);

    let none = NumericToleranceStrategy::default().score("banana", "42");
    assert_eq!(none.score, 0.0);
    assert_eq!(none.confidence, Some(1.0));
}

#[test]
fn test_judge_parser_examples() {
    let json = parse_judge_reply(JUDGE_REPLY_JSON);
    assert!((json.score - 0.85).abs() < 1e-9);
    assert_eq!(json.notes.as_deref(), Some("good"));

    assert!((parse_judge_reply(JUDGE_REPLY_TEN_SCALE).score - 0.7).abs() < 1e-9);
    assert_eq!(parse_judge_reply(JUDGE_REPLY_RUBRIC_FAILED).score, 0.0);

    let garbage = parse_judge_reply(JUDGE_REPLY_GARBAGE);
    assert_eq!(garbage.score, 0.0);
    assert_eq!(garbage.confidence, Some(0.0));
}

#[test]
fn test_judge_parser_fixture_shapes() {
    let fenced = parse_judge_reply(JUDGE_REPLY_FENCED);
    assert!((fenced.score - 0.72).abs() < 1e-9);
    assert_eq!(fenced.confidence, Some(JSON_CONFIDENCE));

    // (90 + 70) / 2
    assert!((parse_judge_reply(JUDGE_REPLY_RUBRIC_PASSED).score - 0.8).abs() < 1e-9);
    assert!((parse_judge_reply(JUDGE_REPLY_PROSE).score - 0.8).abs() < 1e-9);
}

// ============================================================================
// Judge scorer
// ============================================================================

#[tokio::test]
async fn test_judge_scores_reply() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.script_completion("judge", ScriptedReply::text(JUDGE_REPLY_JSON));
    let scorer = LlmJudgeScorer::new(gateway.clone());

    let suite = create_judge_suite();
    let cancel = CancellationToken::new();
    let ctx = JudgeContext {
        model: "judge",
        rubric_addendum: suite.judge_system_prompt.as_deref(),
        cancel: &cancel,
    };

    let result = scorer.score(&suite.test_cases[0], "A function calling itself.", &ctx).await;
    assert!((result.score - 0.85).abs() < 1e-9);

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].streaming);
    assert_eq!(calls[0].params.temperature, JudgeConfig::default().temperature);

    let system = &calls[0].messages[0];
    assert_eq!(system.role, ChatRole::System);
    assert!(system.content.starts_with(JUDGE_RUBRIC));
    assert!(system.content.contains("Penalise answers longer than two sentences."));

    let task = &calls[0].messages[1].content;
    assert!(task.contains("Explain recursion in one sentence."));
    assert!(task.contains("A function that calls itself"));
    assert!(task.contains("A function calling itself."));
}

#[tokio::test]
async fn test_judge_skips_empty_response() {
    let gateway = Arc::new(ScriptedGateway::new());
    let scorer = LlmJudgeScorer::new(gateway.clone());
    let suite = create_judge_suite();
    let cancel = CancellationToken::new();
    let ctx = JudgeContext {
        model: "judge",
        rubric_addendum: None,
        cancel: &cancel,
    };

    let result = scorer.score(&suite.test_cases[0], "   ", &ctx).await;
    assert_eq!(result.score, 0.0);
    assert_eq!(gateway.total_calls(), 0);
}

#[tokio::test]
async fn test_judge_gateway_failure_is_contained() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.script_completion(
        "judge",
        ScriptedReply::Error(GatewayError::Http {
            status: 503,
            body: "overloaded".to_string(),
        }),
    );
    let scorer = LlmJudgeScorer::new(gateway);
    let suite = create_judge_suite();
    let cancel = CancellationToken::new();
    let ctx = JudgeContext {
        model: "judge",
        rubric_addendum: None,
        cancel: &cancel,
    };

    let result = scorer.score(&suite.test_cases[0], "something", &ctx).await;
    assert_eq!(result.score, 0.0);
    assert_eq!(result.confidence, Some(0.0));
    assert!(result.notes.unwrap().starts_with("Judge call failed"));
}

#[tokio::test]
async fn test_dispatcher_routes_judge_cases() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.script_completion("judge", ScriptedReply::text("Score: 60"));
    let dispatcher = ScoringDispatcher::new().with_judge(LlmJudgeScorer::new(gateway));
    let suite = create_judge_suite();
    let cancel = CancellationToken::new();
    let ctx = JudgeContext {
        model: "judge",
        rubric_addendum: None,
        cancel: &cancel,
    };

    let judged = dispatcher.score(&suite.test_cases[0], "recursion", Some(&ctx)).await;
    assert!((judged.score - 0.6).abs() < 1e-9);

    // No judge context: boolean fallback against the expected text
    let fallback = dispatcher
        .score(&suite.test_cases[0], "a function that calls itself", None)
        .await;
    assert_eq!(fallback.score, 1.0);
    assert!(fallback.notes.unwrap().contains("boolean"));
}

#[tokio::test]
async fn test_dispatcher_scores_mixed_suite() {
    let dispatcher = ScoringDispatcher::new();
    let suite = create_test_suite();
    let answers = ["Paris", "The product is 42.", "  17 ", "Yes, it is."];

    for (case, answer) in suite.test_cases.iter().zip(answers) {
        let result = dispatcher.score(case, answer, None).await;
        assert_eq!(result.score, 1.0, "{} scored {:?}", case.id, result);
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn test_scores_stay_in_unit_range(response in ".{0,40}", expected in ".{0,20}") {
        let strategies: [&dyn ScoringStrategy; 4] = [
            &ExactMatchStrategy,
            &RegexMatchStrategy,
            &NumericToleranceStrategy::default(),
            &BooleanStrategy,
        ];
        for strategy in strategies {
            let result = strategy.score(&response, &expected);
            prop_assert!((0.0..=1.0).contains(&result.score));
            if let Some(confidence) = result.confidence {
                prop_assert!((0.0..=1.0).contains(&confidence));
            }
        }
    }

    #[test]
    fn test_scoring_is_idempotent(response in "[a-zA-Z0-9 .]{0,30}", expected in "[a-zA-Z0-9 .]{0,15}") {
        let exact = ExactMatchStrategy;
        prop_assert_eq!(exact.score(&response, &expected), exact.score(&response, &expected));

        let numeric = NumericToleranceStrategy::default();
        prop_assert_eq!(numeric.score(&response, &expected), numeric.score(&response, &expected));

        let regex = RegexMatchStrategy;
        prop_assert_eq!(regex.score(&response, &expected), regex.score(&response, &expected));

        let boolean = BooleanStrategy;
        prop_assert_eq!(boolean.score(&response, &expected), boolean.score(&response, &expected));

        prop_assert_eq!(parse_judge_reply(&response), parse_judge_reply(&response));
    }

    #[test]
    fn test_exact_match_tiers_are_ordered(expected in "[a-z]{3,20}", padding in "[a-z ]{1,8}") {
        let s = ExactMatchStrategy;
        let mut near = expected.clone();
        near.pop();
        near.push('0');

        let exact = s.score(&expected, &expected).score;
        let upper = s.score(&expected.to_uppercase(), &expected).score;
        let padded = s.score(&format!("Answer: {}{}", expected, padding), &expected).score;
        let missed = s.score(&near, &expected).score;

        prop_assert_eq!(exact, 1.0);
        prop_assert!(exact >= upper);
        prop_assert!(upper >= padded);
        prop_assert!(padded >= missed);
        prop_assert!(missed >= 0.0);
        prop_assert!((0.6..=0.95).contains(&padded));
        prop_assert!(missed <= 0.7);
    }

    #[test]
    fn test_numeric_credit_decreases_with_distance(expected in 1.0f64..1000.0, near in 0.02f64..0.1, extra in 0.01f64..0.1) {
        let s = NumericToleranceStrategy::new(0.0, 0.01);
        let close = s.score(&format!("{}", expected * (1.0 + near)), &format!("{}", expected)).score;
        let far = s.score(&format!("{}", expected * (1.0 + near + extra)), &format!("{}", expected)).score;
        prop_assert!(close >= far);
    }

    #[test]
    fn test_judge_parser_never_panics(reply in "\\PC{0,200}") {
        let result = parse_judge_reply(&reply);
        prop_assert!((0.0..=1.0).contains(&result.score));
    }

    #[test]
    fn test_judge_json_scale(score in 11u32..=100) {
        let result = parse_judge_reply(&format!("{{\"score\": {}}}", score));
        prop_assert!((result.score - score as f64 / 100.0).abs() < 1e-9);
    }
}

#[test]
fn test_every_deterministic_method_is_registered() {
    let dispatcher = ScoringDispatcher::new();
    for method in ScoringMethod::all() {
        if !method.requires_judge() {
            let result = dispatcher.score_sync(*method, "1", "1");
            assert_eq!(result.score, 1.0, "{}", method);
        }
    }
}
