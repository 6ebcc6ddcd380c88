//! LLM-judge scoring: prompt construction, the judge call, and reply parsing.

mod parser;
mod prompt;
mod scorer;

pub use parser::{
    parse_free_text, parse_json, parse_judge_reply, parse_rubric, unparseable, FREE_TEXT_CONFIDENCE,
    JSON_CONFIDENCE, RUBRIC_CONFIDENCE,
};
pub use prompt::{JudgePrompt, JUDGE_RUBRIC};
pub use scorer::{JudgeContext, LlmJudgeScorer};
