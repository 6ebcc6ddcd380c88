//! Normalized scoring output.

use serde::{Deserialize, Serialize};

/// Outcome of scoring one response.
///
/// `score` is always on the 0..=1 scale. `raw_score`/`max_score` keep the
/// strategy's native scale for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    /// Normalized score in `[0, 1]`
    pub score: f64,
    /// How much the strategy trusts its own score, in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Score on the strategy's own scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_score: Option<f64>,
    /// Upper bound of the strategy's own scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    /// Human-readable explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl ScoringResult {
    /// Result with the score clamped into `[0, 1]`; NaN becomes 0
    pub fn new(score: f64) -> Self {
        Self {
            score: unit(score),
            confidence: None,
            raw_score: None,
            max_score: None,
            notes: None,
        }
    }

    /// Zero score that must not be read as a real measurement
    pub fn unreliable(notes: impl Into<String>) -> Self {
        Self::new(0.0).with_confidence(0.0).with_notes(notes)
    }

    /// Set the confidence, clamped into `[0, 1]`
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(unit(confidence));
        self
    }

    /// Record the native-scale score
    pub fn with_raw(mut self, raw_score: f64, max_score: f64) -> Self {
        self.raw_score = Some(raw_score);
        self.max_score = Some(max_score);
        self
    }

    /// Attach notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// True for a confident pass
    pub fn is_pass(&self) -> bool {
        self.score >= 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_and_confidence_are_clamped() {
        let result = ScoringResult::new(1.7).with_confidence(-0.2);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.confidence, Some(0.0));
        assert_eq!(ScoringResult::new(f64::NAN).score, 0.0);
    }

    #[test]
    fn unreliable_has_zero_confidence() {
        let result = ScoringResult::unreliable("judge failed");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, Some(0.0));
        assert_eq!(result.notes.as_deref(), Some("judge failed"));
    }
}
