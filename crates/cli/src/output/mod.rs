//! Output formatting for CLI

use serde::{Deserialize, Serialize};

mod formatters;
mod table;

pub use formatters::{format_cost, format_latency, format_per_million, format_score, JsonFormatter};
pub use table::TableFormatter;

/// Output format enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table output (default)
    #[default]
    Table,
    /// JSON output
    Json,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Color helpers
pub mod colors {
    use colored::*;

    pub fn success(s: &str) -> ColoredString {
        s.green()
    }

    pub fn error(s: &str) -> ColoredString {
        s.red()
    }

    pub fn warning(s: &str) -> ColoredString {
        s.yellow()
    }

    pub fn dim(s: &str) -> ColoredString {
        s.dimmed()
    }

    pub fn bold(s: &str) -> ColoredString {
        s.bold()
    }

    /// Green for high scores, yellow for middling, red for low
    pub fn score(value: f64, text: &str) -> ColoredString {
        if value >= 0.8 {
            text.green()
        } else if value >= 0.5 {
            text.yellow()
        } else {
            text.red()
        }
    }
}
