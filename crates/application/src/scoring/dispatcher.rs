//! Routes a test case to its scoring method.

use super::judge::{JudgeContext, LlmJudgeScorer};
use super::strategies::{
    BooleanStrategy, ExactMatchStrategy, NumericToleranceStrategy, RegexMatchStrategy,
    ScoringStrategy,
};
use benchmaker_common::ScoringConfig;
use benchmaker_domain::{ScoringMethod, ScoringResult, TestCase};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Scoring dispatcher.
///
/// Holds one strategy per deterministic method and an optional judge. A
/// test case asking for `llm-judge` with no judge configured is scored with
/// the boolean strategy and a note saying so.
pub struct ScoringDispatcher {
    strategies: HashMap<ScoringMethod, Arc<dyn ScoringStrategy>>,
    judge: Option<LlmJudgeScorer>,
}

impl ScoringDispatcher {
    /// Dispatcher with the built-in strategies and default tolerances
    pub fn new() -> Self {
        Self::with_config(&ScoringConfig::default())
    }

    /// Dispatcher with tolerances from configuration
    pub fn with_config(config: &ScoringConfig) -> Self {
        let mut dispatcher = Self {
            strategies: HashMap::new(),
            judge: None,
        };

        dispatcher.register_strategy(ScoringMethod::ExactMatch, Arc::new(ExactMatchStrategy));
        dispatcher.register_strategy(ScoringMethod::RegexMatch, Arc::new(RegexMatchStrategy));
        dispatcher.register_strategy(
            ScoringMethod::NumericTolerance,
            Arc::new(NumericToleranceStrategy::new(
                config.numeric_absolute_tolerance,
                config.numeric_relative_tolerance,
            )),
        );
        dispatcher.register_strategy(ScoringMethod::Boolean, Arc::new(BooleanStrategy));

        dispatcher
    }

    /// Attach the judge used for `llm-judge` test cases
    pub fn with_judge(mut self, judge: LlmJudgeScorer) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Replace the strategy for a method
    pub fn register_strategy(&mut self, method: ScoringMethod, strategy: Arc<dyn ScoringStrategy>) {
        self.strategies.insert(method, strategy);
    }

    /// Whether a judge is attached
    pub fn has_judge(&self) -> bool {
        self.judge.is_some()
    }

    /// Score with a deterministic method, no judge involved
    pub fn score_sync(&self, method: ScoringMethod, response: &str, expected: &str) -> ScoringResult {
        match self.strategies.get(&method) {
            Some(strategy) => strategy.score(response, expected),
            None => ScoringResult::unreliable(format!("No strategy registered for {}", method)),
        }
    }

    /// Score one response.
    ///
    /// `judge` is needed only for `llm-judge` test cases; when it or the
    /// scorer is missing, the boolean strategy runs instead.
    #[instrument(skip(self, test_case, response, judge), fields(test_case_id = %test_case.id, method = %test_case.scoring_method))]
    pub async fn score(
        &self,
        test_case: &TestCase,
        response: &str,
        judge: Option<&JudgeContext<'_>>,
    ) -> ScoringResult {
        let method = test_case.scoring_method;
        if !method.requires_judge() {
            let result = self.score_sync(method, response, test_case.expected());
            debug!(score = result.score, "Scored");
            return result;
        }

        match (&self.judge, judge) {
            (Some(scorer), Some(ctx)) => scorer.score(test_case, response, ctx).await,
            _ => {
                warn!("No judge configured, falling back to boolean scoring");
                let fallback = self.score_sync(ScoringMethod::Boolean, response, test_case.expected());
                let note = match fallback.notes.as_deref() {
                    Some(notes) => format!("No judge model configured; scored as boolean ({})", notes),
                    None => "No judge model configured; scored as boolean".to_string(),
                };
                fallback.with_notes(note)
            }
        }
    }
}

impl Default for ScoringDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
