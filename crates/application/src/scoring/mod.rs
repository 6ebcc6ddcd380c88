//! Scoring module - turns model responses into normalized scores
//!
//! Deterministic strategies (exact, regex, numeric, boolean) run inline. The
//! `llm-judge` method calls a judge model through the inference gateway and
//! parses its verdict.

mod dispatcher;
pub mod judge;
mod strategies;

pub use dispatcher::ScoringDispatcher;
pub use judge::{parse_judge_reply, JudgeContext, JudgePrompt, LlmJudgeScorer};
pub use strategies::{
    BooleanStrategy, ExactMatchStrategy, NumericToleranceStrategy, RegexMatchStrategy,
    ScoringStrategy,
};
