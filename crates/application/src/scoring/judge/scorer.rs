//! LLM-as-judge scoring.

use super::parser::parse_judge_reply;
use super::prompt::JudgePrompt;
use crate::gateway::InferenceGateway;
use benchmaker_common::{CancellationToken, JudgeConfig};
use benchmaker_domain::{ModelParameters, ScoringResult, TestCase};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Per-run judge settings
#[derive(Debug, Clone, Copy)]
pub struct JudgeContext<'a> {
    /// Model used as the judge
    pub model: &'a str,
    /// Suite-specific grading instructions appended to the rubric
    pub rubric_addendum: Option<&'a str>,
    /// Cancellation for the judge call
    pub cancel: &'a CancellationToken,
}

/// Scores a response by asking another model to grade it
pub struct LlmJudgeScorer {
    gateway: Arc<dyn InferenceGateway>,
    params: ModelParameters,
}

impl LlmJudgeScorer {
    /// Judge with low-temperature defaults
    pub fn new(gateway: Arc<dyn InferenceGateway>) -> Self {
        Self::with_config(gateway, &JudgeConfig::default())
    }

    /// Judge sampling taken from configuration
    pub fn with_config(gateway: Arc<dyn InferenceGateway>, config: &JudgeConfig) -> Self {
        Self {
            gateway,
            params: ModelParameters {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                ..ModelParameters::default()
            },
        }
    }

    /// Sampling parameters sent with each judge call
    pub fn parameters(&self) -> &ModelParameters {
        &self.params
    }

    /// Grade `response` for `test_case`.
    ///
    /// Never fails: an empty response scores 0 without a judge call, and a
    /// failed judge call scores 0 with zero confidence.
    #[instrument(skip(self, test_case, response, ctx), fields(test_case_id = %test_case.id, judge = ctx.model))]
    pub async fn score(&self, test_case: &TestCase, response: &str, ctx: &JudgeContext<'_>) -> ScoringResult {
        if response.trim().is_empty() {
            return ScoringResult::new(0.0)
                .with_confidence(1.0)
                .with_notes("Empty response; nothing to evaluate");
        }

        let prompt = JudgePrompt::build(
            &test_case.prompt,
            response,
            test_case.expected_output.as_deref(),
            ctx.rubric_addendum,
        );

        match self
            .gateway
            .chat_completion(ctx.model, &prompt.messages(), &self.params, ctx.cancel)
            .await
        {
            Ok(reply) => {
                let result = parse_judge_reply(&reply.content);
                debug!(score = result.score, confidence = ?result.confidence, "Judge reply parsed");
                result
            }
            Err(e) => {
                warn!(error = %e, "Judge call failed");
                ScoringResult::unreliable(format!("Judge call failed: {}", e))
            }
        }
    }
}
