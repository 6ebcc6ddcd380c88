//! Deterministic scoring strategies.
//!
//! Each strategy is a pure function of `(response, expected)`; scoring the
//! same pair twice yields an identical [`ScoringResult`]. Invalid
//! configuration degrades to a zero-confidence zero score instead of an error.

use benchmaker_domain::ScoringResult;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// A synchronous scoring method
pub trait ScoringStrategy: Send + Sync {
    /// Score a response against the expected output
    fn score(&self, response: &str, expected: &str) -> ScoringResult;

    /// Method name
    fn name(&self) -> &'static str;
}

/// Graded string match.
///
/// | tier | score |
/// |---|---|
/// | empty expected | 1.0 |
/// | exact (trimmed) | 1.0 |
/// | case-insensitive | 0.95 |
/// | contains | 0.95 down to 0.6 as padding grows |
/// | similarity > 0.5 | 0.2 to 0.7 |
/// | similarity in (0.2, 0.5] | 0 to 0.2 |
/// | otherwise | 0 |
pub struct ExactMatchStrategy;

const CASE_INSENSITIVE_SCORE: f64 = 0.95;
const CONTAINS_FLOOR: f64 = 0.6;

impl ExactMatchStrategy {
    /// Levenshtein distance over chars, two rows at a time
    pub(crate) fn levenshtein_distance(s1: &str, s2: &str) -> usize {
        let a: Vec<char> = s1.chars().collect();
        let b: Vec<char> = s2.chars().collect();

        if a.is_empty() {
            return b.len();
        }
        if b.is_empty() {
            return a.len();
        }

        let mut previous: Vec<usize> = (0..=b.len()).collect();
        let mut current = vec![0; b.len() + 1];

        for (i, ca) in a.iter().enumerate() {
            current[0] = i + 1;
            for (j, cb) in b.iter().enumerate() {
                let cost = usize::from(ca != cb);
                current[j + 1] = (previous[j + 1] + 1)
                    .min(current[j] + 1)
                    .min(previous[j] + cost);
            }
            std::mem::swap(&mut previous, &mut current);
        }

        previous[b.len()]
    }

    /// Normalized similarity in `[0, 1]`
    pub(crate) fn similarity(s1: &str, s2: &str) -> f64 {
        let max_len = s1.chars().count().max(s2.chars().count());
        if max_len == 0 {
            return 1.0;
        }
        1.0 - Self::levenshtein_distance(s1, s2) as f64 / max_len as f64
    }

    fn similarity_score(similarity: f64) -> f64 {
        if similarity > 0.5 {
            0.2 + (similarity - 0.5) / 0.5 * 0.5
        } else if similarity > 0.2 {
            (similarity - 0.2) / 0.3 * 0.2
        } else {
            0.0
        }
    }
}

impl ScoringStrategy for ExactMatchStrategy {
    fn score(&self, response: &str, expected: &str) -> ScoringResult {
        let response = response.trim();
        let expected = expected.trim();

        if expected.is_empty() {
            return ScoringResult::new(1.0)
                .with_confidence(1.0)
                .with_notes("No expected output; nothing to check");
        }
        if response == expected {
            return ScoringResult::new(1.0).with_confidence(1.0).with_notes("Exact match");
        }

        let response_lower = response.to_lowercase();
        let expected_lower = expected.to_lowercase();

        if response_lower == expected_lower {
            return ScoringResult::new(CASE_INSENSITIVE_SCORE)
                .with_confidence(1.0)
                .with_notes("Case-insensitive match");
        }

        if response_lower.contains(&expected_lower) {
            let response_len = response_lower.chars().count() as f64;
            let extra = response_len - expected_lower.chars().count() as f64;
            let padding = (extra / response_len).clamp(0.0, 1.0);
            let score = CASE_INSENSITIVE_SCORE - (CASE_INSENSITIVE_SCORE - CONTAINS_FLOOR) * padding;
            return ScoringResult::new(score.max(CONTAINS_FLOOR))
                .with_confidence(1.0)
                .with_notes(format!(
                    "Expected output found inside response ({:.0}% surrounding content)",
                    padding * 100.0
                ));
        }

        let similarity = Self::similarity(&response_lower, &expected_lower);
        let score = Self::similarity_score(similarity);
        debug!(similarity, score, "Exact match fell back to similarity");

        ScoringResult::new(score)
            .with_confidence(1.0)
            .with_notes(format!("No match; similarity {:.2}", similarity))
    }

    fn name(&self) -> &'static str {
        "exact-match"
    }
}

/// Regular expression match; expected is `/pattern/flags` or a bare pattern.
/// Only known flag letters make a delimited pattern, so `/usr/bin` is bare.
pub struct RegexMatchStrategy;

static DELIMITED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^/(.*)/([gimsuyxd]*)$").expect("delimited pattern regex is valid"));

impl RegexMatchStrategy {
    /// Compile the expected pattern, honouring `i`, `m`, `s` and `x` flags.
    /// `g`, `u`, `y` and `d` have no meaning for a single match and are ignored.
    pub fn compile(expected: &str) -> Result<Regex, String> {
        let expected = expected.trim();
        if expected.is_empty() {
            return Err("No pattern configured".to_string());
        }

        let (pattern, flags) = match DELIMITED_PATTERN.captures(expected) {
            Some(caps) => (
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map_or("", |m| m.as_str()),
            ),
            None => (expected, ""),
        };

        let mut builder = RegexBuilder::new(pattern);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                _ => {}
            }
        }

        builder.build().map_err(|e| format!("Invalid pattern: {}", e))
    }
}

impl ScoringStrategy for RegexMatchStrategy {
    fn score(&self, response: &str, expected: &str) -> ScoringResult {
        match Self::compile(expected) {
            Ok(regex) if regex.is_match(response) => ScoringResult::new(1.0)
                .with_confidence(1.0)
                .with_notes("Pattern matched"),
            Ok(_) => ScoringResult::new(0.0)
                .with_confidence(1.0)
                .with_notes("Pattern did not match"),
            Err(reason) => ScoringResult::unreliable(reason),
        }
    }

    fn name(&self) -> &'static str {
        "regex-match"
    }
}

/// Numeric comparison with a tolerance band and continuous partial credit
pub struct NumericToleranceStrategy {
    absolute_tolerance: f64,
    relative_tolerance: f64,
}

/// Relative error at which partial credit reaches zero
const PARTIAL_CREDIT_CUTOFF: f64 = 0.25;

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?(?:[eE][+-]?\d+)?|-?\.\d+(?:[eE][+-]?\d+)?")
        .expect("number regex is valid")
});

impl Default for NumericToleranceStrategy {
    fn default() -> Self {
        Self::new(0.01, 0.01)
    }
}

impl NumericToleranceStrategy {
    /// Strategy with an absolute band and a relative band; either admits a match
    pub fn new(absolute_tolerance: f64, relative_tolerance: f64) -> Self {
        Self {
            absolute_tolerance: absolute_tolerance.max(0.0),
            relative_tolerance: relative_tolerance.max(0.0),
        }
    }

    /// Every number in `text`, in order of appearance
    pub fn extract_numbers(text: &str) -> Vec<f64> {
        NUMBER
            .find_iter(text)
            .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .collect()
    }

    fn within_tolerance(&self, actual: f64, expected: f64) -> bool {
        let diff = (actual - expected).abs();
        diff <= self.absolute_tolerance || diff <= self.relative_tolerance * expected.abs()
    }

    fn partial_credit(relative_error: f64) -> f64 {
        if relative_error >= PARTIAL_CREDIT_CUTOFF {
            0.0
        } else {
            1.0 - (relative_error / PARTIAL_CREDIT_CUTOFF).sqrt()
        }
    }
}

impl ScoringStrategy for NumericToleranceStrategy {
    fn score(&self, response: &str, expected: &str) -> ScoringResult {
        let Some(expected_value) = Self::extract_numbers(expected).first().copied() else {
            return ScoringResult::unreliable(format!("Expected value '{}' is not a number", expected.trim()));
        };

        let numbers = Self::extract_numbers(response);
        if numbers.is_empty() {
            return ScoringResult::new(0.0)
                .with_confidence(1.0)
                .with_notes("No numbers found in response");
        }

        if let Some(hit) = numbers.iter().find(|n| self.within_tolerance(**n, expected_value)) {
            return ScoringResult::new(1.0)
                .with_confidence(1.0)
                .with_notes(format!("Found {} within tolerance of {}", hit, expected_value));
        }

        let closest = numbers
            .iter()
            .copied()
            .min_by(|a, b| {
                (a - expected_value)
                    .abs()
                    .total_cmp(&(b - expected_value).abs())
            })
            .unwrap_or(numbers[0]);
        let diff = (closest - expected_value).abs();
        let relative_error = if expected_value == 0.0 {
            diff
        } else {
            diff / expected_value.abs()
        };
        let score = Self::partial_credit(relative_error);

        debug!(closest, expected = expected_value, relative_error, score, "Numeric partial credit");

        ScoringResult::new(score).with_confidence(1.0).with_notes(format!(
            "Closest value {} vs expected {} ({:.1}% off)",
            closest,
            expected_value,
            relative_error * 100.0
        ))
    }

    fn name(&self) -> &'static str {
        "numeric-tolerance"
    }
}

/// Case-insensitive containment; empty expected passes
pub struct BooleanStrategy;

impl ScoringStrategy for BooleanStrategy {
    fn score(&self, response: &str, expected: &str) -> ScoringResult {
        let expected = expected.trim();
        if expected.is_empty() {
            return ScoringResult::new(1.0)
                .with_confidence(1.0)
                .with_notes("No expected output; auto-pass");
        }

        if response.to_lowercase().contains(&expected.to_lowercase()) {
            ScoringResult::new(1.0)
                .with_confidence(1.0)
                .with_notes("Expected text found")
        } else {
            ScoringResult::new(0.0)
                .with_confidence(1.0)
                .with_notes("Expected text not found")
        }
    }

    fn name(&self) -> &'static str {
        "boolean"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_tiers() {
        let s = ExactMatchStrategy;
        assert_eq!(s.score("Paris", "Paris").score, 1.0);
        assert_eq!(s.score("  Paris\n", "Paris").score, 1.0);
        assert_eq!(s.score("paris", "Paris").score, 0.95);
        assert_eq!(s.score("anything", "").score, 1.0);

        let contained = s.score("The answer is Paris.", "Paris").score;
        assert!(contained >= 0.6 && contained < 0.95, "{contained}");

        let similar = s.score("Pariss", "Paris").score;
        assert!(similar > 0.2 && similar <= 0.7, "{similar}");

        assert_eq!(s.score("xyz", "Paris").score, 0.0);
    }

    #[test]
    fn test_padding_lowers_contains_score() {
        let s = ExactMatchStrategy;
        let terse = s.score("Answer: Paris", "Paris").score;
        let verbose = s.score(
            "After careful consideration of European geography the answer is Paris",
            "Paris",
        )
        .score;
        assert!(terse > verbose);
        assert!(verbose >= 0.6);
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(ExactMatchStrategy::levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(ExactMatchStrategy::levenshtein_distance("", "abc"), 3);
        assert_eq!(ExactMatchStrategy::levenshtein_distance("héllo", "hello"), 1);
        assert_eq!(ExactMatchStrategy::similarity("", ""), 1.0);
    }

    #[test]
    fn test_regex_match() {
        let s = RegexMatchStrategy;
        assert_eq!(s.score("cat123", r"/\d+/").score, 1.0);
        assert_eq!(s.score("cat", r"/\d+/").score, 0.0);
        assert_eq!(s.score("cat", r"/\d+/").confidence, Some(1.0));
        assert_eq!(s.score("HELLO", "/hello/i").score, 1.0);
        assert_eq!(s.score("HELLO", "hello").score, 0.0);
        assert_eq!(s.score("a\nb", "/a.b/s").score, 1.0);
        assert_eq!(s.score("x = 42", "/\\d+/g").score, 1.0);
    }

    #[test]
    fn test_regex_bare_pattern_with_slashes() {
        let s = RegexMatchStrategy;
        assert_eq!(s.score("see /usr/bin/env", "/usr/bin/.*").score, 1.0);
        assert_eq!(s.score("path is /usr/bin", "/usr/bin").score, 1.0);
        assert_eq!(s.score("path is /usr/lib", "/usr/bin").score, 0.0);
        assert_eq!(s.score("/abc/q", "/abc/q").score, 1.0);
    }

    #[test]
    fn test_invalid_regex_has_zero_confidence() {
        let s = RegexMatchStrategy;
        let result = s.score("anything", "/([a-z/");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, Some(0.0));

        let result = s.score("anything", "");
        assert_eq!(result.confidence, Some(0.0));
    }

    #[test]
    fn test_numeric_exact_and_partial() {
        let s = NumericToleranceStrategy::default();
        assert_eq!(s.score("42", "42").score, 1.0);
        assert_eq!(s.score("The answer is 42.3", "42").score, 1.0);

        let s = NumericToleranceStrategy::new(0.1, 0.01);
        let partial = s.score("roughly 45", "42");
        assert!(partial.score > 0.0 && partial.score < 1.0, "{}", partial.score);
        assert!((partial.score - (1.0 - ((3.0 / 42.0) / 0.25f64).sqrt())).abs() < 1e-12);

        assert_eq!(s.score("about 60", "42").score, 0.0);
    }

    #[test]
    fn test_numeric_no_numbers() {
        let result = NumericToleranceStrategy::default().score("banana", "42");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, Some(1.0));
    }

    #[test]
    fn test_numeric_unparseable_expected() {
        let result = NumericToleranceStrategy::default().score("42", "forty-two");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, Some(0.0));
    }

    #[test]
    fn test_extract_numbers() {
        let numbers = NumericToleranceStrategy::extract_numbers("-3, 1,234.5 and 6.02e23 or .5");
        assert_eq!(numbers, vec![-3.0, 1234.5, 6.02e23, 0.5]);
    }

    #[test]
    fn test_numeric_picks_closest_candidate() {
        let s = NumericToleranceStrategy::default();
        assert_eq!(s.score("Between 10 and 42 apples", "42").score, 1.0);
        let near = s.score("Either 10 or 44", "42").score;
        let far = s.score("Either 10 or 50", "42").score;
        assert!(near > far);
    }

    #[test]
    fn test_boolean() {
        let s = BooleanStrategy;
        assert_eq!(s.score("Yes, it is TRUE.", "true").score, 1.0);
        assert_eq!(s.score("no", "true").score, 0.0);
        assert_eq!(s.score("anything", "  ").score, 1.0);
    }
}
