//! Test cases and the suites that own them.

use crate::validation::ValidationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// How a model response is turned into a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringMethod {
    /// Graded string comparison against the expected output
    #[default]
    ExactMatch,
    /// Expected output is a regular expression
    RegexMatch,
    /// Expected output is a number, compared with tolerance
    NumericTolerance,
    /// Case-insensitive containment of the expected text
    Boolean,
    /// Another model grades the response
    LlmJudge,
}

impl ScoringMethod {
    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactMatch => "exact-match",
            Self::RegexMatch => "regex-match",
            Self::NumericTolerance => "numeric-tolerance",
            Self::Boolean => "boolean",
            Self::LlmJudge => "llm-judge",
        }
    }

    /// Whether scoring needs a network round-trip
    pub fn requires_judge(&self) -> bool {
        matches!(self, Self::LlmJudge)
    }

    /// All methods in display order
    pub fn all() -> &'static [ScoringMethod] {
        &[
            Self::ExactMatch,
            Self::RegexMatch,
            Self::NumericTolerance,
            Self::Boolean,
            Self::LlmJudge,
        ]
    }
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown scoring method: {s}"))
    }
}

/// Difficulty label attached by the suite author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Easy
    Easy,
    /// Medium
    Medium,
    /// Hard
    Hard,
}

/// Descriptive metadata; never consulted by scoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCaseMetadata {
    /// Free-form category
    pub category: Option<String>,
    /// Difficulty label
    pub difficulty: Option<Difficulty>,
    /// Free-form tags
    pub tags: Vec<String>,
}

fn default_weight() -> f64 {
    1.0
}

/// A single prompt plus its scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Identifier, unique within the suite
    pub id: String,
    /// Prompt sent to every model
    pub prompt: String,
    /// Expected output; its meaning depends on the scoring method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    /// Scoring method
    #[serde(default)]
    pub scoring_method: ScoringMethod,
    /// Weight in the per-run aggregate; must be positive
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Descriptive metadata
    #[serde(default)]
    pub metadata: TestCaseMetadata,
}

impl TestCase {
    /// Create a test case with weight 1 and no expected output
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, method: ScoringMethod) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            expected_output: None,
            scoring_method: method,
            weight: default_weight(),
            metadata: TestCaseMetadata::default(),
        }
    }

    /// Set the expected output
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }

    /// Set the weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Expected output, empty when absent
    pub fn expected(&self) -> &str {
        self.expected_output.as_deref().unwrap_or("")
    }
}

/// An ordered collection of test cases run together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    /// Identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// System prompt prepended to every candidate call; empty means none
    #[serde(default)]
    pub system_prompt: String,
    /// Suite-specific addendum for the judge rubric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_system_prompt: Option<String>,
    /// Test cases in authoring order
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    /// Creation time
    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl TestSuite {
    /// Create an empty suite
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            system_prompt: String::new(),
            judge_system_prompt: None,
            test_cases: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a test case by id
    pub fn test_case(&self, id: &str) -> Option<&TestCase> {
        self.test_cases.iter().find(|tc| tc.id == id)
    }

    /// Weight of a test case, 1.0 when the case is unknown
    pub fn weight_of(&self, test_case_id: &str) -> f64 {
        self.test_case(test_case_id).map(|tc| tc.weight).unwrap_or(1.0)
    }

    /// System prompt, if one is set
    pub fn system_prompt(&self) -> Option<&str> {
        let prompt = self.system_prompt.trim();
        (!prompt.is_empty()).then_some(self.system_prompt.as_str())
    }

    /// Check the suite before it is handed to the orchestrator
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        if self.id.trim().is_empty() {
            result.add_error("id", "Suite id must not be empty");
        }
        if self.test_cases.is_empty() {
            result.add_warning("testCases", "Suite has no test cases");
        }

        let mut seen = HashSet::new();
        for (i, tc) in self.test_cases.iter().enumerate() {
            let path = format!("testCases[{i}]");
            if tc.id.trim().is_empty() {
                result.add_error(format!("{path}.id"), "Test case id must not be empty");
            } else if !seen.insert(tc.id.as_str()) {
                result.add_error(format!("{path}.id"), format!("Duplicate test case id '{}'", tc.id));
            }
            if tc.prompt.trim().is_empty() {
                result.add_error(format!("{path}.prompt"), "Prompt must not be empty");
            }
            if !(tc.weight.is_finite() && tc.weight > 0.0) {
                result.add_error(format!("{path}.weight"), "Weight must be a positive number");
            }
            match tc.scoring_method {
                ScoringMethod::RegexMatch | ScoringMethod::NumericTolerance
                    if tc.expected().trim().is_empty() =>
                {
                    result.add_warning(
                        format!("{path}.expectedOutput"),
                        format!("{} without an expected value always scores 0", tc.scoring_method),
                    );
                }
                ScoringMethod::LlmJudge => {
                    result.add_warning(
                        format!("{path}.scoringMethod"),
                        "llm-judge falls back to boolean scoring when no judge model is selected",
                    );
                }
                _ => {}
            }
        }

        result
    }
}
