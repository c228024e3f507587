use crate::error::HarnessError;
use crate::report::aggregate::{first_chunk_file, Language};
use crate::suite::model::ResultSet;
use std::path::Path;
use tracing::info;

fn to_harness_error(destination: &Path, err: csv::Error) -> HarnessError {
    match err.into_kind() {
        csv::ErrorKind::Io(io_err) => HarnessError::io(destination, io_err),
        other => HarnessError::io(
            destination,
            std::io::Error::other(format!("csv error: {:?}", other)),
        ),
    }
}

/// One row per test case, in execution order. `File` and `Language` come
/// from the first payload chunk, empty when a case has none.
pub fn export_table(result_set: &ResultSet, destination: &Path) -> Result<(), HarnessError> {
    let mut writer =
        csv::Writer::from_path(destination).map_err(|err| to_harness_error(destination, err))?;
    writer
        .write_record([
            "Category",
            "Test Name",
            "Status",
            "Duration (ms)",
            "File",
            "Language",
        ])
        .map_err(|err| to_harness_error(destination, err))?;

    for tc in &result_set.test_cases {
        let status = if tc.passed { "PASS" } else { "FAIL" };
        let file_name = first_chunk_file(tc).unwrap_or_default();
        let language = match file_name.rsplit_once('.') {
            Some((_, ext)) => Language::from_extension(ext).label(),
            None => String::new(),
        };
        writer
            .write_record([
                tc.category.as_str(),
                tc.name.as_str(),
                status,
                &tc.duration_ms.to_string(),
                &file_name,
                &language,
            ])
            .map_err(|err| to_harness_error(destination, err))?;
    }
    writer
        .flush()
        .map_err(|err| HarnessError::io(destination, err))?;
    info!("csv exported to {}", destination.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::aggregate;
    use crate::suite::model::TestCase;
    use serde_json::json;

    fn case(name: &str, passed: bool, payload: serde_json::Value) -> TestCase {
        TestCase {
            name: name.to_string(),
            category: "Export".to_string(),
            payload,
            expected: None,
            actual: None,
            duration_ms: 120,
            passed,
            skipped: false,
            error: None,
        }
    }

    #[test]
    fn exports_header_plus_one_row_per_case() {
        let test_cases = vec![
            case(
                "passes",
                true,
                json!({"chunks": [{"file_name": "src/math.rs", "lines_add": "a", "lines_remove": ""}]}),
            ),
            case("fails", false, json!({})),
        ];
        let rs = ResultSet {
            timestamp: "2025-01-03T10:00:00Z".to_string(),
            summary: aggregate::summarize_cases(&test_cases),
            test_cases,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        export_table(&rs, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Category,Test Name,Status,Duration (ms),File,Language"
        );
        assert!(lines[1].contains("PASS"));
        assert!(lines[1].contains("src/math.rs"));
        assert!(lines[1].contains("Rust"));
        assert!(lines[2].contains("FAIL"));
        // No chunk: file and language columns stay empty.
        assert!(lines[2].ends_with(",,"));
    }

    #[test]
    fn unwritable_destination_propagates_io_error() {
        let rs = ResultSet {
            timestamp: "2025-01-03T10:00:00Z".to_string(),
            summary: Default::default(),
            test_cases: vec![],
        };
        let err = export_table(&rs, Path::new("/nonexistent-dir/summary.csv")).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }
}
