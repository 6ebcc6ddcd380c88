//! Multi-run statistical comparison.
//!
//! Each completed run contributes one sample per model: the weighted mean of
//! that model's scored results. Samples are summarised per model and compared
//! pairwise with a two-sample test using a normal approximation of the
//! p-value.

use benchmaker_common::StatisticsConfig;
use benchmaker_domain::{
    ComparisonReport, ModelComparison, MultiRunStats, NotComparable, RunId, RunResult, RunStatus,
    StatsError, TestMethod, TestSuite,
};
use tracing::{debug, instrument};

const Z_95: f64 = 1.96;
const MIN_SAMPLES: usize = 2;

/// Computes confidence intervals, t-tests and effect sizes across runs
#[derive(Debug, Clone)]
pub struct StatisticalAnalyzer {
    significance_level: f64,
    method: TestMethod,
}

impl Default for StatisticalAnalyzer {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            method: TestMethod::Pooled,
        }
    }
}

impl StatisticalAnalyzer {
    /// Analyzer configured from the statistics section
    pub fn new(config: &StatisticsConfig) -> Self {
        Self {
            significance_level: config.significance_level,
            method: config.test_method,
        }
    }

    /// Use Welch or pooled standard error
    pub fn with_method(mut self, method: TestMethod) -> Self {
        self.method = method;
        self
    }

    /// Weighted mean of one model's scored results in one run.
    ///
    /// Unscored results are skipped. `None` when nothing was scored.
    pub fn aggregate_score(&self, run: &RunResult, model_id: &str, suite: &TestSuite) -> Option<f64> {
        let (weighted, weights, scores, count) = run.results_for_model(model_id).fold(
            (0.0, 0.0, 0.0, 0usize),
            |(weighted, weights, scores, count), result| match result.score_value() {
                Some(score) => {
                    let weight = suite.weight_of(&result.test_case_id);
                    (weighted + score * weight, weights + weight, scores + score, count + 1)
                }
                None => (weighted, weights, scores, count),
            },
        );

        if count == 0 {
            None
        } else if weights > 0.0 {
            Some(weighted / weights)
        } else {
            Some(scores / count as f64)
        }
    }

    /// Summarise one model across runs
    pub fn multi_run_stats(
        &self,
        model_id: &str,
        runs: &[RunResult],
        suite: &TestSuite,
    ) -> Result<MultiRunStats, StatsError> {
        let (run_ids, scores): (Vec<RunId>, Vec<f64>) = runs
            .iter()
            .filter_map(|run| self.aggregate_score(run, model_id, suite).map(|s| (run.id, s)))
            .unzip();

        if scores.is_empty() {
            return Err(StatsError::ModelNotFound(model_id.to_string()));
        }

        Ok(describe(model_id, run_ids, scores))
    }

    /// Two-sample comparison of A against B; each needs at least two samples
    pub fn compare(&self, a: &MultiRunStats, b: &MultiRunStats) -> Result<ModelComparison, StatsError> {
        for stats in [a, b] {
            if stats.samples() < MIN_SAMPLES {
                return Err(StatsError::InsufficientSamples {
                    model_id: stats.model_id.clone(),
                    samples: stats.samples(),
                });
            }
        }

        let n_a = a.samples() as f64;
        let n_b = b.samples() as f64;
        let var_a = a.std_dev.powi(2);
        let var_b = b.std_dev.powi(2);

        let pooled_variance = ((n_a - 1.0) * var_a + (n_b - 1.0) * var_b) / (n_a + n_b - 2.0);
        let pooled_std_dev = pooled_variance.sqrt();

        let std_err = match self.method {
            TestMethod::Pooled => pooled_std_dev * (1.0 / n_a + 1.0 / n_b).sqrt(),
            TestMethod::Welch => (var_a / n_a + var_b / n_b).sqrt(),
        };

        let diff = a.mean - b.mean;
        let t_statistic = ratio(diff, std_err);
        let p_value = if t_statistic == 0.0 {
            1.0
        } else {
            (2.0 * (1.0 - standard_normal_cdf(t_statistic.abs()))).clamp(0.0, 1.0)
        };

        Ok(ModelComparison {
            model_a: a.model_id.clone(),
            model_b: b.model_id.clone(),
            mean_a: a.mean,
            mean_b: b.mean,
            score_diff: diff,
            pooled_std_err: std_err,
            t_statistic,
            p_value,
            is_significant: p_value < self.significance_level,
            effect_size: ratio(diff, pooled_std_dev),
        })
    }

    /// Compare two raw score vectors
    pub fn compare_models(
        &self,
        model_a: &str,
        scores_a: &[f64],
        model_b: &str,
        scores_b: &[f64],
    ) -> Result<ModelComparison, StatsError> {
        let a = describe_scores(model_a, scores_a)?;
        let b = describe_scores(model_b, scores_b)?;
        self.compare(&a, &b)
    }

    /// Full report over the completed runs of one suite.
    ///
    /// Models are ordered by descending mean; pairs lacking samples are
    /// listed as not comparable instead of failing the report.
    #[instrument(skip(self, runs, suite), fields(suite_id = %suite.id, runs = runs.len()))]
    pub fn report(&self, runs: &[RunResult], suite: &TestSuite) -> Result<ComparisonReport, StatsError> {
        let completed: Vec<RunResult> = runs
            .iter()
            .filter(|run| run.status == RunStatus::Completed)
            .cloned()
            .collect();

        if completed.is_empty() {
            return Err(StatsError::NoRuns);
        }
        if let Some(stray) = completed.iter().find(|run| run.test_suite_id != suite.id) {
            return Err(StatsError::MixedSuites {
                expected: suite.id.clone(),
                found: stray.test_suite_id.clone(),
            });
        }

        let mut models: Vec<&str> = Vec::new();
        for model in completed.iter().flat_map(|run| run.models.iter()) {
            if !models.contains(&model.as_str()) {
                models.push(model.as_str());
            }
        }

        let mut model_stats: Vec<MultiRunStats> = models
            .iter()
            .filter_map(|model| self.multi_run_stats(model, &completed, suite).ok())
            .collect();
        model_stats.sort_by(|a, b| b.mean.total_cmp(&a.mean));

        let mut comparisons = Vec::new();
        let mut not_comparable = Vec::new();
        for (i, a) in model_stats.iter().enumerate() {
            for b in &model_stats[i + 1..] {
                match self.compare(a, b) {
                    Ok(comparison) => comparisons.push(comparison),
                    Err(e) => not_comparable.push(NotComparable {
                        model_a: a.model_id.clone(),
                        model_b: b.model_id.clone(),
                        reason: e.to_string(),
                    }),
                }
            }
        }

        debug!(
            models = model_stats.len(),
            comparisons = comparisons.len(),
            skipped = not_comparable.len(),
            "Comparison report built"
        );

        Ok(ComparisonReport {
            test_suite_id: suite.id.clone(),
            run_ids: completed.iter().map(|run| run.id).collect(),
            model_stats,
            comparisons,
            not_comparable,
        })
    }
}

fn describe_scores(model_id: &str, scores: &[f64]) -> Result<MultiRunStats, StatsError> {
    if scores.is_empty() {
        return Err(StatsError::InsufficientSamples {
            model_id: model_id.to_string(),
            samples: 0,
        });
    }
    Ok(describe(model_id, Vec::new(), scores.to_vec()))
}

fn describe(model_id: &str, run_ids: Vec<RunId>, scores: Vec<f64>) -> MultiRunStats {
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let std_dev = (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n).sqrt();
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let margin = Z_95 * std_dev / n.sqrt();

    MultiRunStats {
        model_id: model_id.to_string(),
        run_ids,
        scores,
        mean,
        std_dev,
        min,
        max,
        confidence95: ((mean - margin).clamp(0.0, 1.0), (mean + margin).clamp(0.0, 1.0)),
    }
}

/// `numerator / denominator`, with 0/0 as 0 and x/0 as a signed infinity
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else if numerator == 0.0 {
        0.0
    } else {
        f64::INFINITY.copysign(numerator)
    }
}

/// Approximate standard normal CDF using error function approximation
pub fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Error function approximation (Horner's method)
fn erf(x: f64) -> f64 {
    // Abramowitz and Stegun 7.1.26
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}
