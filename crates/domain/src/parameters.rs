//! Sampling parameters sent with every candidate call.

use serde::{Deserialize, Serialize};

/// Sampling parameters shared by all models in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelParameters {
    /// Sampling temperature
    pub temperature: f64,
    /// Nucleus sampling cutoff
    pub top_p: f64,
    /// Completion token limit
    pub max_tokens: u32,
    /// Frequency penalty
    #[serde(default)]
    pub frequency_penalty: f64,
    /// Presence penalty
    #[serde(default)]
    pub presence_penalty: f64,
    /// Determinism override; see [`ModelParameters::effective`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark_mode: Option<bool>,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 1024,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            benchmark_mode: None,
        }
    }
}

impl ModelParameters {
    /// Whether benchmark mode is switched on
    pub fn is_benchmark_mode(&self) -> bool {
        self.benchmark_mode.unwrap_or(false)
    }

    /// Parameters actually sent upstream.
    ///
    /// Benchmark mode forces temperature and both penalties to zero no matter
    /// what is stored.
    pub fn effective(&self) -> Self {
        if !self.is_benchmark_mode() {
            return self.clone();
        }
        Self {
            temperature: 0.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            ..self.clone()
        }
    }
}
