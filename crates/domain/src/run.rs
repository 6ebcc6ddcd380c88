//! Runs and their per-(test case, model) results.

use crate::identifiers::RunId;
use crate::model::TokenUsage;
use crate::parameters::ModelParameters;
use crate::scoring::ScoringResult;
use crate::test_case::TestSuite;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one (test case, model) result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    /// Not started
    #[default]
    Idle,
    /// Request in flight
    Running,
    /// Response received
    Completed,
    /// Gave up after retries or hit a hard error
    Failed,
    /// Stopped by a cancellation signal
    Cancelled,
}

impl ResultStatus {
    /// Whether the result can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Tasks are still being driven
    Running,
    /// Sealed; no further mutation
    Completed,
}

/// Composite key of a result inside a run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultKey {
    /// Test case id
    pub test_case_id: String,
    /// Model id
    pub model_id: String,
}

impl ResultKey {
    /// Build a key
    pub fn new(test_case_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            test_case_id: test_case_id.into(),
            model_id: model_id.into(),
        }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.test_case_id, self.model_id)
    }
}

/// Outcome of one test case against one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    /// Test case id
    pub test_case_id: String,
    /// Model id
    pub model_id: String,
    /// Final response text
    #[serde(default)]
    pub response: String,
    /// Text received so far while streaming
    #[serde(default)]
    pub streamed_content: String,
    /// Lifecycle status
    #[serde(default)]
    pub status: ResultStatus,
    /// Wall-clock latency of the successful attempt chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_counts: Option<TokenUsage>,
    /// Cost in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Score; absent means not yet scored, never zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoringResult>,
    /// Error message of a failed result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestCaseResult {
    /// A fresh idle result
    pub fn idle(test_case_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            test_case_id: test_case_id.into(),
            model_id: model_id.into(),
            response: String::new(),
            streamed_content: String::new(),
            status: ResultStatus::Idle,
            latency_ms: None,
            token_counts: None,
            cost: None,
            score: None,
            error: None,
        }
    }

    /// Key of this result
    pub fn key(&self) -> ResultKey {
        ResultKey::new(&self.test_case_id, &self.model_id)
    }

    /// Whether this result matches a key
    pub fn matches(&self, test_case_id: &str, model_id: &str) -> bool {
        self.test_case_id == test_case_id && self.model_id == model_id
    }

    /// Normalized score if one has been attached
    pub fn score_value(&self) -> Option<f64> {
        self.score.as_ref().map(|s| s.score)
    }
}

/// Partial update applied to a result; `None` fields are left alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultUpdate {
    /// New response text
    pub response: Option<String>,
    /// New streamed text
    pub streamed_content: Option<String>,
    /// New status
    pub status: Option<ResultStatus>,
    /// Latency
    pub latency_ms: Option<u64>,
    /// Token usage
    pub token_counts: Option<TokenUsage>,
    /// Cost
    pub cost: Option<f64>,
    /// Error message
    pub error: Option<String>,
}

impl ResultUpdate {
    /// Update that only changes the status
    pub fn status(status: ResultStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Update carrying the text streamed so far
    pub fn streamed(content: impl Into<String>) -> Self {
        Self {
            streamed_content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Mark the result failed with a message
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(ResultStatus::Failed),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Apply onto a result
    pub fn apply(self, result: &mut TestCaseResult) {
        if let Some(response) = self.response {
            result.response = response;
        }
        if let Some(streamed) = self.streamed_content {
            result.streamed_content = streamed;
        }
        if let Some(status) = self.status {
            result.status = status;
        }
        if let Some(latency) = self.latency_ms {
            result.latency_ms = Some(latency);
        }
        if let Some(usage) = self.token_counts {
            result.token_counts = Some(usage);
        }
        if let Some(cost) = self.cost {
            result.cost = Some(cost);
        }
        if let Some(error) = self.error {
            result.error = Some(error);
        }
    }
}

/// One execution of a suite against a set of models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Run id
    pub id: RunId,
    /// Suite the run executed
    pub test_suite_id: String,
    /// Suite name at run time
    #[serde(default)]
    pub test_suite_name: String,
    /// Model ids in selection order
    pub models: Vec<String>,
    /// Parameters as stored; benchmark mode is applied at call time
    pub parameters: ModelParameters,
    /// Judge model used for llm-judge cases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_model: Option<String>,
    /// One result per (test case, model) pair
    pub results: Vec<TestCaseResult>,
    /// Run status
    pub status: RunStatus,
    /// Whether cancellation stopped the run early
    #[serde(default)]
    pub cancelled: bool,
    /// Start time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    /// Seal time
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunResult {
    /// Start a run with an idle result for every (test case, model) pair
    pub fn new(
        suite: &TestSuite,
        models: Vec<String>,
        parameters: ModelParameters,
        judge_model: Option<String>,
    ) -> Self {
        let results = suite
            .test_cases
            .iter()
            .flat_map(|tc| models.iter().map(move |m| TestCaseResult::idle(&tc.id, m)))
            .collect();

        Self {
            id: RunId::new(),
            test_suite_id: suite.id.clone(),
            test_suite_name: suite.name.clone(),
            models,
            parameters,
            judge_model,
            results,
            status: RunStatus::Running,
            cancelled: false,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Look up a result
    pub fn result(&self, test_case_id: &str, model_id: &str) -> Option<&TestCaseResult> {
        self.results.iter().find(|r| r.matches(test_case_id, model_id))
    }

    /// Look up a result mutably
    pub fn result_mut(&mut self, test_case_id: &str, model_id: &str) -> Option<&mut TestCaseResult> {
        self.results.iter_mut().find(|r| r.matches(test_case_id, model_id))
    }

    /// Results belonging to one model
    pub fn results_for_model<'a>(&'a self, model_id: &'a str) -> impl Iterator<Item = &'a TestCaseResult> + 'a {
        self.results.iter().filter(move |r| r.model_id == model_id)
    }

    /// Whether the run has been sealed
    pub fn is_sealed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Seal the run.
    ///
    /// Anything still running is marked cancelled so no result stays running
    /// forever. Idle results stay idle.
    pub fn seal(&mut self, cancelled: bool) {
        for result in &mut self.results {
            if result.status == ResultStatus::Running {
                result.status = ResultStatus::Cancelled;
            }
        }
        self.cancelled = self.cancelled || cancelled;
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Status counts for display
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total: self.results.len(),
            was_cancelled: self.cancelled,
            ..Default::default()
        };
        for result in &self.results {
            match result.status {
                ResultStatus::Idle => summary.idle += 1,
                ResultStatus::Running => summary.running += 1,
                ResultStatus::Completed => summary.completed += 1,
                ResultStatus::Failed => summary.failed += 1,
                ResultStatus::Cancelled => summary.cancelled += 1,
            }
            if result.score.is_some() {
                summary.scored += 1;
            }
        }
        summary
    }
}

/// Status counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Number of results
    pub total: usize,
    /// Idle results
    pub idle: usize,
    /// Running results
    pub running: usize,
    /// Completed results
    pub completed: usize,
    /// Failed results
    pub failed: usize,
    /// Cancelled results
    pub cancelled: usize,
    /// Results carrying a score
    pub scored: usize,
    /// Whether the run was cancelled
    pub was_cancelled: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} completed, {} failed, cancelled: {}",
            self.completed,
            self.total,
            self.failed,
            if self.was_cancelled { "yes" } else { "no" }
        )
    }
}
