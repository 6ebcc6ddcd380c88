//! Test fixtures for generating domain entities with realistic data.
//!
//! This module provides functions to create suites, models and judge replies
//! with sensible defaults and optional randomization.

use crate::builders::{TestCaseBuilder, TestSuiteBuilder};
use benchmaker_domain::{
    Difficulty, ModelInfo, ModelParameters, ModelPricing, ScoringMethod, TestCase, TestSuite, TokenUsage,
};
use fake::{
    faker::lorem::en::{Sentence, Word},
    Fake,
};

/// Judge reply: clean JSON
pub const JUDGE_REPLY_JSON: &str = r#"{"score": 85, "reasoning": "good"}"#;

/// Judge reply: JSON on a ten-point scale
pub const JUDGE_REPLY_TEN_SCALE: &str = r#"{"score": 7}"#;

/// Judge reply: fenced JSON inside prose
pub const JUDGE_REPLY_FENCED: &str = "Let me evaluate this.\n\n```json\n{\n  \"score\": 72,\n  \"reasoning\": \"Mostly correct, misses one edge case.\",\n}\n```\n\nHope this helps.";

/// Judge reply: rubric with a failed constraint
pub const JUDGE_REPLY_RUBRIC_FAILED: &str =
    "Constraint Satisfaction: No\nSemantic Score: 9/10\nPersona Score: 8/10";

/// Judge reply: rubric with a satisfied constraint
pub const JUDGE_REPLY_RUBRIC_PASSED: &str =
    "Constraint Satisfaction: Yes\nSemantic Score: 9/10\nPersona Score: 70/100";

/// Judge reply: a number buried in prose
pub const JUDGE_REPLY_PROSE: &str = "The candidate is accurate and concise. Rating: 8/10.";

/// Judge reply: nothing recognisable
pub const JUDGE_REPLY_GARBAGE: &str = "garbage text with no number";

/// Create a test case with a random prompt
pub fn create_test_case(id: &str, method: ScoringMethod) -> TestCase {
    let prompt: String = Sentence(4..10).fake();
    TestCaseBuilder::new(id)
        .with_prompt(prompt)
        .with_method(method)
        .with_category(Word().fake::<String>())
        .build()
}

/// Create a suite with one case per deterministic method
pub fn create_test_suite() -> TestSuite {
    TestSuiteBuilder::new()
        .with_id("suite-mixed")
        .with_name("Mixed Methods")
        .with_system_prompt("Answer as briefly as possible.")
        .with_case(
            TestCaseBuilder::new("capital")
                .with_prompt("What is the capital of France?")
                .exact("Paris")
                .with_category("geography")
                .with_difficulty(Difficulty::Easy)
                .build(),
        )
        .with_case(
            TestCaseBuilder::new("arithmetic")
                .with_prompt("What is 6 times 7?")
                .numeric("42")
                .with_weight(2.0)
                .build(),
        )
        .with_case(
            TestCaseBuilder::new("digits")
                .with_prompt("Reply with a number.")
                .with_method(ScoringMethod::RegexMatch)
                .with_expected(r"/^\s*\d+\s*$/")
                .build(),
        )
        .with_case(
            TestCaseBuilder::new("truthy")
                .with_prompt("Is water wet? Answer yes or no.")
                .with_method(ScoringMethod::Boolean)
                .with_expected("yes")
                .build(),
        )
        .build()
}

/// Create a suite whose cases are all graded by a judge
pub fn create_judge_suite() -> TestSuite {
    TestSuiteBuilder::new()
        .with_id("suite-judge")
        .with_name("Judged")
        .with_judge_prompt("Penalise answers longer than two sentences.")
        .with_case(
            TestCaseBuilder::new("essay")
                .with_prompt("Explain recursion in one sentence.")
                .with_expected("A function that calls itself")
                .judged()
                .build(),
        )
        .build()
}

/// Create a suite of `count` exact-match cases expecting "42"
pub fn create_uniform_suite(count: usize) -> TestSuite {
    TestSuiteBuilder::new()
        .with_id("suite-uniform")
        .with_name("Uniform")
        .with_exact_cases(count)
        .build()
}

/// Create a priced model
pub fn create_test_model(id: &str) -> ModelInfo {
    ModelInfo {
        id: id.to_string(),
        name: format!("Test {}", id),
        context_length: Some(8192),
        pricing: ModelPricing {
            prompt: 0.000_001,
            completion: 0.000_002,
        },
    }
}

/// Create `count` priced models `model-a`, `model-b`, ...
pub fn create_test_models(count: usize) -> Vec<ModelInfo> {
    (0..count)
        .map(|i| create_test_model(&format!("model-{}", (b'a' + (i % 26) as u8) as char)))
        .collect()
}

/// Deterministic benchmark-mode parameters
pub fn create_test_parameters() -> ModelParameters {
    ModelParameters {
        benchmark_mode: Some(true),
        ..ModelParameters::default()
    }
}

/// Usage reported by the scripted gateway
pub fn create_test_usage() -> TokenUsage {
    TokenUsage::new(100, 50)
}
