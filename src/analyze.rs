use crate::error::HarnessError;
use crate::report::{aggregate, export, render};
use crate::suite::model::ResultSet;
use std::path::Path;

/// Loads a persisted result set. A missing artifact is a hard precondition
/// failure; analysis never proceeds with defaults.
pub fn load_results(path: &Path) -> Result<ResultSet, HarnessError> {
    if !path.exists() {
        return Err(HarnessError::io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "result artifact not found; run the suite first (memprobe run)",
            ),
        ));
    }
    ResultSet::load(path)
}

/// Full analysis pass over a completed run: recompute every aggregate from
/// the test cases (the stored summary is never trusted), render the report,
/// export the CSV. Returns the failed count for the exit-code contract.
pub fn run_analysis(
    results_path: &Path,
    csv_path: &Path,
    verbose: bool,
) -> Result<u64, HarnessError> {
    let result_set = load_results(results_path)?;

    println!("Test run: {}", result_set.timestamp);
    println!();

    let summary = aggregate::summarize(&result_set);
    print!("{}", render::render_summary(&summary));
    println!();

    let perf = aggregate::performance_stats(&result_set);
    print!("{}", render::render_performance(perf.as_ref()));
    println!();

    let distribution =
        aggregate::distribution_by_extension(&result_set, aggregate::first_chunk_file);
    print!("{}", render::render_distribution(&distribution));
    println!();

    let buckets = aggregate::change_size_buckets(&result_set);
    print!("{}", render::render_size_buckets(&buckets));
    println!();

    print!("{}", render::render_failures(&result_set));

    export::export_table(&result_set, csv_path)?;
    println!();
    println!("CSV exported to: {}", csv_path.display());

    if verbose {
        println!();
        print!("{}", render::render_verbose(&result_set));
    }

    println!();
    if summary.failed == 0 {
        println!("All tests passed.");
    } else {
        println!("{} test(s) need attention", summary.failed);
    }

    Ok(summary.failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::model::{Summary, TestCase};
    use serde_json::json;

    #[test]
    fn missing_artifact_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("test_results.json");
        let err = load_results(&missing).unwrap_err();
        match err {
            HarnessError::Io { destination, source } => {
                assert_eq!(destination, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {}", other),
        }
    }

    #[test]
    fn malformed_artifact_reports_path_and_reason() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_results.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_results(&path).unwrap_err();
        assert!(matches!(err, HarnessError::Malformed { .. }));
    }

    #[test]
    fn analysis_returns_failed_count() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("test_results.json");
        let csv = dir.path().join("summary.csv");
        let test_cases = vec![
            TestCase {
                name: "good".to_string(),
                category: "c".to_string(),
                payload: json!({}),
                expected: None,
                actual: None,
                duration_ms: 10,
                passed: true,
                skipped: false,
                error: None,
            },
            TestCase {
                name: "bad".to_string(),
                category: "c".to_string(),
                payload: json!({}),
                expected: None,
                actual: None,
                duration_ms: 20,
                passed: false,
                skipped: false,
                error: Some("HTTP 500".to_string()),
            },
        ];
        let result_set = ResultSet {
            timestamp: "2025-01-03T10:00:00Z".to_string(),
            // Deliberately wrong stored summary: analysis must recompute.
            summary: Summary::default(),
            test_cases,
        };
        result_set.save(&results).unwrap();

        let failed = run_analysis(&results, &csv, false).unwrap();
        assert_eq!(failed, 1);
        assert!(csv.exists());
    }
}
