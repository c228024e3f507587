use crate::error::HarnessError;
use crate::report::aggregate;
use crate::suite::model::{ResultSet, TestCase};
use chrono::Utc;
use tracing::info;

/// Accumulates test case records during a run. Names are unique within a
/// run; once finalized the sequence is frozen.
pub struct ResultRecorder {
    test_cases: Vec<TestCase>,
    timestamp: Option<String>,
    closed: bool,
}

impl ResultRecorder {
    pub fn new() -> Self {
        ResultRecorder {
            test_cases: Vec::new(),
            timestamp: None,
            closed: false,
        }
    }

    pub fn record(&mut self, test_case: TestCase) -> Result<(), HarnessError> {
        if self.closed {
            return Err(HarnessError::RunClosed);
        }
        if self
            .test_cases
            .iter()
            .any(|existing| existing.name == test_case.name)
        {
            return Err(HarnessError::DuplicateName(test_case.name));
        }
        self.test_cases.push(test_case);
        Ok(())
    }

    /// Stamps the run timestamp if unset, freezes the sequence, and returns
    /// the result set with its derived summary.
    pub fn finalize(&mut self) -> ResultSet {
        self.closed = true;
        let timestamp = self
            .timestamp
            .get_or_insert_with(|| Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string())
            .clone();
        let summary = aggregate::summarize_cases(&self.test_cases);
        info!(
            "run finalized: {} cases, {} failed",
            summary.total, summary.failed
        );
        ResultSet {
            timestamp,
            summary,
            test_cases: self.test_cases.clone(),
        }
    }
}

impl Default for ResultRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn case(name: &str, category: &str, passed: bool) -> TestCase {
        TestCase {
            name: name.to_string(),
            category: category.to_string(),
            payload: json!({}),
            expected: None,
            actual: None,
            duration_ms: 0,
            passed,
            skipped: false,
            error: if passed {
                None
            } else {
                Some("boom".to_string())
            },
        }
    }

    #[test]
    fn duplicate_name_is_rejected_and_first_record_kept() {
        let mut recorder = ResultRecorder::new();
        recorder.record(case("same", "a", true)).unwrap();
        let err = recorder.record(case("same", "b", false)).unwrap_err();
        assert!(matches!(err, HarnessError::DuplicateName(name) if name == "same"));

        let result_set = recorder.finalize();
        assert_eq!(result_set.test_cases.len(), 1);
        assert_eq!(result_set.test_cases[0].category, "a");
    }

    #[test]
    fn record_after_finalize_fails_with_run_closed() {
        let mut recorder = ResultRecorder::new();
        recorder.record(case("one", "a", true)).unwrap();
        let first = recorder.finalize();
        assert!(!first.timestamp.is_empty());

        let err = recorder.record(case("two", "a", true)).unwrap_err();
        assert!(matches!(err, HarnessError::RunClosed));
    }

    #[test]
    fn finalize_derives_consistent_summary() {
        let mut recorder = ResultRecorder::new();
        recorder.record(case("p1", "ingest", true)).unwrap();
        recorder.record(case("p2", "ingest", false)).unwrap();
        recorder.record(case("p3", "search", true)).unwrap();
        let result_set = recorder.finalize();
        let summary = &result_set.summary;
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed + summary.failed, summary.total);
        let ingest = summary.by_category.get("ingest").unwrap();
        assert_eq!(ingest.total, 2);
        assert_eq!(ingest.passed, 1);
        assert_eq!(ingest.failed, 1);
    }
}
