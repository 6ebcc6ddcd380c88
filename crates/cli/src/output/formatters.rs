//! Output formatters

use anyhow::Result;
use serde::Serialize;

/// JSON formatter
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format a value as pretty JSON
    pub fn format<T: Serialize>(value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }
}

/// Score in [0, 1] as a percentage
pub fn format_score(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

/// USD amount with enough precision for sub-cent costs
pub fn format_cost(cost: f64) -> String {
    if cost == 0.0 {
        "$0".to_string()
    } else if cost < 0.01 {
        format!("${:.6}", cost)
    } else {
        format!("${:.4}", cost)
    }
}

/// Per-token price shown per million tokens
pub fn format_per_million(price: f64) -> String {
    if price == 0.0 {
        "free".to_string()
    } else {
        format!("${:.2}", price * 1_000_000.0)
    }
}

pub fn format_latency(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else {
        format!("{:.0}ms", ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestData {
        name: String,
        count: i32,
    }

    #[test]
    fn test_json_formatter() {
        let data = TestData {
            name: "test".to_string(),
            count: 42,
        };
        let result = JsonFormatter::format(&data).unwrap();
        assert!(result.contains("\"count\": 42"));
    }

    #[test]
    fn test_number_formats() {
        assert_eq!(format_score(0.857), "85.7%");
        assert_eq!(format_cost(0.0002), "$0.000200");
        assert_eq!(format_cost(1.5), "$1.5000");
        assert_eq!(format_per_million(0.000_000_15), "$0.15");
        assert_eq!(format_per_million(0.0), "free");
        assert_eq!(format_latency(1530.0), "1.53s");
        assert_eq!(format_latency(87.4), "87ms");
    }
}
