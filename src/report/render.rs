use crate::report::aggregate::{LanguageCount, PerfStats, SizeBuckets};
use crate::suite::model::{ResultSet, Summary};
use std::fmt::Write;

const RULE: &str = "================================================================================";
const THIN_RULE: &str =
    "--------------------------------------------------------------------------------";

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "TEST RESULTS");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Total tests: {}", summary.total);
    let _ = writeln!(out, "Passed: {}", summary.passed);
    let _ = writeln!(out, "Failed: {}", summary.failed);
    if summary.total > 0 {
        let pass_rate = summary.passed as f64 / summary.total as f64 * 100.0;
        let _ = writeln!(out, "Pass rate: {:.1}%", pass_rate);
    }
    if !summary.by_category.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "By category:");
        for (category, stats) in summary.by_category.iter() {
            let pass_rate = if stats.total > 0 {
                stats.passed as f64 / stats.total as f64 * 100.0
            } else {
                0.0
            };
            let marker = if stats.failed == 0 { "ok" } else { "!!" };
            let _ = writeln!(
                out,
                "  [{}] {}: {}/{} ({:.0}%)",
                marker, category, stats.passed, stats.total, pass_rate
            );
        }
    }
    out
}

pub fn render_performance(stats: Option<&PerfStats>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Performance:");
    match stats {
        None => {
            let _ = writeln!(out, "  no data (no measured durations)");
        }
        Some(stats) => {
            let _ = writeln!(out, "  Average: {:.1}ms", stats.average_ms);
            let _ = writeln!(out, "  Min: {}ms", stats.min_ms);
            let _ = writeln!(out, "  Max: {}ms", stats.max_ms);
            let _ = writeln!(out, "  Total: {:.1}s", stats.total_ms as f64 / 1000.0);
        }
    }
    out
}

pub fn render_distribution(counts: &[LanguageCount]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Language distribution:");
    if counts.is_empty() {
        let _ = writeln!(out, "  no file-backed test cases");
    }
    for entry in counts {
        let _ = writeln!(out, "  {}: {} tests", entry.language.label(), entry.count);
    }
    out
}

pub fn render_size_buckets(buckets: &SizeBuckets) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Change size:");
    match buckets.percentages() {
        None => {
            let _ = writeln!(out, "  no chunked test cases");
        }
        Some((small, medium, large)) => {
            let _ = writeln!(out, "  Small (<10 lines): {} ({}%)", buckets.small, small);
            let _ = writeln!(
                out,
                "  Medium (10-50 lines): {} ({}%)",
                buckets.medium, medium
            );
            let _ = writeln!(out, "  Large (>=50 lines): {} ({}%)", buckets.large, large);
        }
    }
    out
}

/// Lists every failed case with its category, error, and expected/actual
/// diff. Absent fields are omitted, never printed as empty placeholders.
pub fn render_failures(result_set: &ResultSet) -> String {
    let failed: Vec<_> = result_set
        .test_cases
        .iter()
        .filter(|tc| !tc.passed)
        .collect();
    let mut out = String::new();
    if failed.is_empty() {
        let _ = writeln!(out, "No failures.");
        return out;
    }
    let _ = writeln!(out, "Failed tests ({}):", failed.len());
    let _ = writeln!(out, "{}", THIN_RULE);
    for tc in failed {
        let _ = writeln!(out);
        let _ = writeln!(out, "  Test: {}", tc.name);
        let _ = writeln!(out, "  Category: {}", tc.category);
        if let Some(error) = &tc.error {
            let _ = writeln!(out, "  Error: {}", error);
        }
        if let (Some(expected), Some(actual)) = (&tc.expected, &tc.actual) {
            let _ = writeln!(out, "  Expected: {}", expected);
            let _ = writeln!(out, "  Actual: {}", actual);
        }
    }
    out
}

pub fn render_verbose(result_set: &ResultSet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Detailed test results:");
    let _ = writeln!(out, "{}", RULE);
    for (idx, tc) in result_set.test_cases.iter().enumerate() {
        let status = if tc.passed { "PASS" } else { "FAIL" };
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}] {} {}", idx + 1, status, tc.name);
        let _ = writeln!(out, "    Category: {}", tc.category);
        let _ = writeln!(out, "    Duration: {}ms", tc.duration_ms);
        if tc.skipped {
            let _ = writeln!(out, "    Skipped: backend unavailable");
        }
        if let Some(chunk) = tc.payload.get("chunks").and_then(|chunks| chunks.get(0)) {
            if let Some(file_name) = chunk.get("file_name").and_then(|v| v.as_str()) {
                let _ = writeln!(out, "    File: {}", file_name);
            }
            if let Some(action) = chunk.get("file_action").and_then(|v| v.as_str()) {
                let _ = writeln!(out, "    Action: {}", action);
            }
            let added = chunk
                .get("lines_add")
                .and_then(|v| v.as_str())
                .map(|s| s.lines().count())
                .unwrap_or(0);
            let removed = chunk
                .get("lines_remove")
                .and_then(|v| v.as_str())
                .map(|s| s.lines().count())
                .unwrap_or(0);
            let _ = writeln!(out, "    Changes: +{} -{}", added, removed);
        }
        if let Some(summary) = tc
            .actual
            .as_ref()
            .and_then(|actual| actual.get("summaries"))
            .and_then(|summaries| summaries.get(0))
            .and_then(|first| first.as_str())
        {
            let _ = writeln!(out, "    Summary: {}", truncate(summary, 60));
        }
    }
    out
}
