//! Derived multi-run statistics. Computed on demand, never persisted.

use crate::identifiers::RunId;
use serde::{Deserialize, Serialize};

/// Standard error used by the two-sample comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMethod {
    /// Pooled-variance standard error
    #[default]
    Pooled,
    /// Welch (unequal variance) standard error
    Welch,
}

/// Per-model aggregate across several runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiRunStats {
    /// Model id
    pub model_id: String,
    /// Runs that contributed a sample, aligned with `scores`
    pub run_ids: Vec<RunId>,
    /// Per-run aggregate scores
    pub scores: Vec<f64>,
    /// Mean of `scores`
    pub mean: f64,
    /// Population standard deviation of `scores`
    pub std_dev: f64,
    /// Smallest score
    pub min: f64,
    /// Largest score
    pub max: f64,
    /// Normal-approximation 95% interval, clamped to `[0, 1]`
    pub confidence95: (f64, f64),
}

impl MultiRunStats {
    /// Number of samples
    pub fn samples(&self) -> usize {
        self.scores.len()
    }
}

/// Two-sample comparison of model A against model B
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelComparison {
    /// First model
    pub model_a: String,
    /// Second model
    pub model_b: String,
    /// Mean of A
    pub mean_a: f64,
    /// Mean of B
    pub mean_b: f64,
    /// `mean_a - mean_b`
    pub score_diff: f64,
    /// Standard error of the difference
    pub pooled_std_err: f64,
    /// `score_diff / pooled_std_err`
    pub t_statistic: f64,
    /// Two-tailed p-value from the normal approximation
    pub p_value: f64,
    /// `p_value` below the significance level
    pub is_significant: bool,
    /// Cohen's d
    pub effect_size: f64,
}

/// A model pair that could not be compared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotComparable {
    /// First model
    pub model_a: String,
    /// Second model
    pub model_b: String,
    /// Why the pair was skipped
    pub reason: String,
}

/// Everything the analyzer knows about a set of runs over one suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    /// Suite shared by all runs
    pub test_suite_id: String,
    /// Runs included
    pub run_ids: Vec<RunId>,
    /// Per-model stats, ordered by descending mean
    pub model_stats: Vec<MultiRunStats>,
    /// Pairwise comparisons
    pub comparisons: Vec<ModelComparison>,
    /// Pairs skipped for lack of samples
    pub not_comparable: Vec<NotComparable>,
}
