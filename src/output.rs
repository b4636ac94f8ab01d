// ==============================================================================
// output.rs - Summary Report Formatting
// ==============================================================================
// Description: Render the run summary as text, JSON or key=value lines
// Author: Matt Barham
// Created: 2025-11-06
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};

use crate::models::SummaryStatistics;

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable summary
    Text,
    /// Single JSON object (for pipelines)
    Json,
    /// One key=value pair per line (for shell scripts)
    #[value(name = "kv")]
    #[serde(rename = "kv")]
    KeyValue,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
            ReportFormat::KeyValue => "kv",
        }
    }
}

/// Render the summary in the requested format (no trailing newline)
pub fn render_report(stats: &SummaryStatistics, format: ReportFormat) -> String {
    match format {
        ReportFormat::Text => render_text(stats),
        ReportFormat::Json => render_json(stats),
        ReportFormat::KeyValue => render_key_value(stats),
    }
}

fn render_text(stats: &SummaryStatistics) -> String {
    [
        format!("Number of individuals to sample = {:.2}", stats.mean),
        format!("Population Standard Deviation = {:.4}", stats.std_dev),
        format!(
            "95% Confidence Interval = ({:.4}, {:.4})",
            stats.ci_lower, stats.ci_upper
        ),
        format!("Iterations performed = {}", stats.iterations),
    ]
    .join("\n")
}

fn render_json(stats: &SummaryStatistics) -> String {
    // SummaryStatistics only holds numbers, which always serialize
    serde_json::to_string_pretty(stats).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

fn render_key_value(stats: &SummaryStatistics) -> String {
    [
        format!("mean={}", stats.mean),
        format!("std_dev={}", stats.std_dev),
        format!("ci_lower={}", stats.ci_lower),
        format!("ci_upper={}", stats.ci_upper),
        format!("iterations={}", stats.iterations),
        format!("min={}", stats.min),
        format!("max={}", stats.max),
        format!("batch={}", stats.batch),
        format!("r2_threshold={}", stats.r2_threshold),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> SummaryStatistics {
        SummaryStatistics {
            mean: 12.5,
            std_dev: 2.5,
            ci_lower: 11.75,
            ci_upper: 13.25,
            iterations: 100,
            min: 5,
            max: 20,
            batch: 5,
            r2_threshold: 0.9,
        }
    }

    #[test]
    fn test_text_report() {
        let text = render_report(&stats(), ReportFormat::Text);
        assert!(text.contains("Number of individuals to sample = 12.50"));
        assert!(text.contains("Population Standard Deviation = 2.5000"));
        assert!(text.contains("95% Confidence Interval = (11.7500, 13.2500)"));
        assert!(text.contains("Iterations performed = 100"));
    }

    #[test]
    fn test_json_report() {
        let json = render_report(&stats(), ReportFormat::Json);
        let parsed: SummaryStatistics = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, stats());
    }

    #[test]
    fn test_key_value_report() {
        let kv = render_report(&stats(), ReportFormat::KeyValue);
        let lines: Vec<&str> = kv.lines().collect();
        assert_eq!(lines[0], "mean=12.5");
        assert!(lines.contains(&"iterations=100"));
        assert!(lines.contains(&"ci_upper=13.25"));
        assert!(lines.iter().all(|l| l.split_once('=').is_some()));
    }

    #[test]
    fn test_report_format_serde() {
        assert_eq!(serde_json::to_string(&ReportFormat::KeyValue).unwrap(), "\"kv\"");
        assert_eq!(ReportFormat::Json.as_str(), "json");
    }
}
