use crate::error::HarnessError;
use crate::verify::model::{Condition, Expectation, NumericPredicate, Verdict};
use serde_json::Value;
use serde_json_path::JsonPath;

/// Evaluates a JSONPath expression against a response document. A parse
/// failure is reported as an error; an empty node list is a valid result.
pub fn evaluate_path(context: &Value, path: &str) -> Result<Vec<Value>, String> {
    match JsonPath::parse(path) {
        Ok(json_path) => Ok(json_path
            .query(context)
            .all()
            .iter()
            .map(|node| (*node).clone())
            .collect()),
        Err(err) => Err(err.to_string()),
    }
}

/// Returns the subset of `field_names` that is missing or null on `actual`.
/// An empty result means full presence.
pub fn verify_field_presence(actual: &Value, field_names: &[&str]) -> Vec<String> {
    field_names
        .iter()
        .filter(|name| match actual.get(**name) {
            None | Some(Value::Null) => true,
            Some(_) => false,
        })
        .map(|name| name.to_string())
        .collect()
}

fn count_of(value: &Value) -> Option<f64> {
    match value {
        Value::Array(items) => Some(items.len() as f64),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Extracts a count-like value (a number, or an array counted by length) at
/// `path` and applies `predicate`. An unresolvable path is `FieldNotFound`,
/// distinct from the predicate being false.
pub fn verify_count(
    actual: &Value,
    path: &str,
    predicate: &NumericPredicate,
) -> Result<bool, HarnessError> {
    let nodes = evaluate_path(actual, path).map_err(HarnessError::AssertionFailed)?;
    let node = nodes.first().ok_or_else(|| HarnessError::FieldNotFound {
        path: path.to_string(),
    })?;
    let count = count_of(node).ok_or_else(|| {
        HarnessError::AssertionFailed(format!("value at {} is not countable: {}", path, node))
    })?;
    Ok(predicate.apply(count))
}

/// Applies every field check in `expectation` to `actual` and folds the
/// mismatches into a single verdict. Pure: neither input is mutated.
pub fn check_expectation(actual: &Value, expectation: &Expectation) -> Verdict {
    let mut mismatches: Vec<String> = Vec::new();
    for check in &expectation.checks {
        match &check.condition {
            Condition::Equals(expected_value) => match evaluate_path(actual, &check.path) {
                Ok(nodes) => match nodes.first() {
                    Some(node) if node == expected_value => {}
                    Some(node) => mismatches.push(format!(
                        "{}: expected {}, but got {}",
                        check.path, expected_value, node
                    )),
                    None => mismatches.push(format!("{}: field not found", check.path)),
                },
                Err(err) => mismatches.push(format!("{}: {}", check.path, err)),
            },
            Condition::Count(predicate) => match verify_count(actual, &check.path, predicate) {
                Ok(true) => {}
                Ok(false) => match evaluate_path(actual, &check.path) {
                    Ok(nodes) => mismatches.push(format!(
                        "{}: expected count {}, but got {}",
                        check.path,
                        predicate.describe(),
                        nodes.first().cloned().unwrap_or(Value::Null)
                    )),
                    Err(err) => mismatches.push(format!("{}: {}", check.path, err)),
                },
                Err(err) => mismatches.push(err.to_string()),
            },
            Condition::Present => {
                let missing = match evaluate_path(actual, &check.path) {
                    Ok(nodes) => !matches!(nodes.first(), Some(node) if !node.is_null()),
                    Err(_) => true,
                };
                if missing {
                    mismatches.push(format!("{}: expected present, but missing or null", check.path));
                }
            }
        }
    }
    let expected = serde_json::to_value(expectation).ok();
    if mismatches.is_empty() {
        Verdict::pass(expected, Some(actual.clone()))
    } else {
        Verdict::fail(expected, Some(actual.clone()), mismatches.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presence_returns_missing_and_null_fields() {
        let actual = json!({
            "status": "success",
            "request_uuid": "abc-123",
            "processing_time": null
        });
        let missing = verify_field_presence(&actual, &["status", "processing_time", "count"]);
        assert_eq!(missing, vec!["processing_time", "count"]);

        let complete = verify_field_presence(&actual, &["status", "request_uuid"]);
        assert!(complete.is_empty());
    }

    #[test]
    fn count_over_numbers_and_arrays() {
        let actual = json!({
            "results": [{"id": "a"}, {"id": "b"}],
            "count": 2
        });
        assert!(verify_count(&actual, "$.results", &NumericPredicate::GreaterThan(0.0)).unwrap());
        assert!(verify_count(&actual, "$.count", &NumericPredicate::EqualTo(2.0)).unwrap());
        assert!(!verify_count(&actual, "$.count", &NumericPredicate::AtLeast(3.0)).unwrap());
    }

    #[test]
    fn missing_path_is_distinct_from_false_predicate() {
        let actual = json!({"count": 0});
        let err = verify_count(&actual, "$.missing", &NumericPredicate::GreaterThan(0.0))
            .unwrap_err();
        assert!(matches!(err, HarnessError::FieldNotFound { .. }));

        // Resolvable path with a false predicate is Ok(false), not an error.
        let ok = verify_count(&actual, "$.count", &NumericPredicate::GreaterThan(0.0)).unwrap();
        assert!(!ok);
    }

    #[test]
    fn expectation_verdict_captures_mismatch_detail() {
        let actual = json!({"status": "error", "ingested_count": 0});
        let expectation = Expectation::ingest_success(1);
        let verdict = check_expectation(&actual, &expectation);
        assert!(!verdict.passed);
        let error = verdict.error.unwrap();
        assert!(error.contains("$.status"));
        assert!(error.contains("$.ingested_count"));
        assert_eq!(verdict.actual.unwrap(), actual);
    }

    #[test]
    fn expectation_passes_on_matching_subset() {
        let actual = json!({
            "status": "success",
            "ingested_count": 1,
            "episode_ids": ["ep-1"],
            "unasserted": "ignored"
        });
        let verdict = check_expectation(&actual, &Expectation::ingest_success(1));
        assert!(verdict.passed);
        assert!(verdict.error.is_none());
    }

    #[test]
    fn present_condition_rejects_null() {
        let actual = json!({"request_uuid": null});
        let verdict =
            check_expectation(&actual, &Expectation::new().present("$.request_uuid"));
        assert!(!verdict.passed);
    }
}
