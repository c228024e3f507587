use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NumericPredicate {
    GreaterThan(f64),
    AtLeast(f64),
    EqualTo(f64),
    LessThan(f64),
}

impl NumericPredicate {
    pub fn apply(&self, value: f64) -> bool {
        match self {
            NumericPredicate::GreaterThan(bound) => value > *bound,
            NumericPredicate::AtLeast(bound) => value >= *bound,
            NumericPredicate::EqualTo(bound) => value == *bound,
            NumericPredicate::LessThan(bound) => value < *bound,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            NumericPredicate::GreaterThan(bound) => format!("> {}", bound),
            NumericPredicate::AtLeast(bound) => format!(">= {}", bound),
            NumericPredicate::EqualTo(bound) => format!("== {}", bound),
            NumericPredicate::LessThan(bound) => format!("< {}", bound),
        }
    }
}

/// Field-scoped condition; only the fields a case names are asserted, the
/// rest of the response is ignored.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Equals(Value),
    Count(NumericPredicate),
    Present,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FieldCheck {
    pub path: String,
    pub condition: Condition,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Expectation {
    pub checks: Vec<FieldCheck>,
}

impl Expectation {
    pub fn new() -> Self {
        Expectation { checks: Vec::new() }
    }

    pub fn equals(mut self, path: &str, value: Value) -> Self {
        self.checks.push(FieldCheck {
            path: path.to_string(),
            condition: Condition::Equals(value),
        });
        self
    }

    pub fn count(mut self, path: &str, predicate: NumericPredicate) -> Self {
        self.checks.push(FieldCheck {
            path: path.to_string(),
            condition: Condition::Count(predicate),
        });
        self
    }

    pub fn present(mut self, path: &str) -> Self {
        self.checks.push(FieldCheck {
            path: path.to_string(),
            condition: Condition::Present,
        });
        self
    }

    /// The usual webhook acceptance criteria.
    pub fn ingest_success(ingested_count: u64) -> Self {
        Expectation::new()
            .equals("$.status", Value::String("success".to_string()))
            .count(
                "$.ingested_count",
                NumericPredicate::EqualTo(ingested_count as f64),
            )
    }
}

/// Outcome of one comparison: the boolean verdict plus the structured diff
/// needed to debug a failure.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Verdict {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Verdict {
    pub fn pass(expected: Option<Value>, actual: Option<Value>) -> Self {
        Verdict {
            passed: true,
            expected,
            actual,
            error: None,
        }
    }

    pub fn fail(expected: Option<Value>, actual: Option<Value>, error: String) -> Self {
        Verdict {
            passed: false,
            expected,
            actual,
            error: Some(error),
        }
    }
}
