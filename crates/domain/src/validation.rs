//! Validation results for suites and configuration.

use crate::errors::AppError;
use serde::{Deserialize, Serialize};

/// Outcome of validating an input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    /// True when there are no errors
    pub valid: bool,
    /// Blocking issues
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking issues
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// A passing result
    pub fn success() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record a blocking issue
    pub fn add_error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationIssue::new(path, message, IssueSeverity::Error));
    }

    /// Record a non-blocking issue
    pub fn add_warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::new(path, message, IssueSeverity::Warning));
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.valid = self.errors.is_empty();
    }

    /// Whether there are warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether there are errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Turn errors into an [`AppError::Validation`]
    pub fn into_result(self) -> Result<Vec<ValidationIssue>, AppError> {
        if self.valid {
            return Ok(self.warnings);
        }
        let message = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::Validation(message))
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

/// A single validation finding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Location, e.g. `testCases[2].weight`
    pub path: String,
    /// Description
    pub message: String,
    /// Severity
    pub severity: IssueSeverity,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>, severity: IssueSeverity) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity,
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Blocks the operation
    Error,
    /// Reported but not blocking
    Warning,
}
