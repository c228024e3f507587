use crate::error::HarnessError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// One executed test unit. Appended to a run's sequence and never mutated or
/// removed afterwards.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TestCase {
    pub name: String,
    pub category: String,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    pub duration_ms: u64,
    pub passed: bool,
    /// Infrastructure-not-available skips are recorded as passes with this
    /// flag set, keeping them distinguishable from a verified pass.
    #[serde(default, skip_serializing_if = "is_false")]
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
}

/// Category → stats mapping that preserves first-seen insertion order for
/// stable display, both in memory and through serde.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryMap {
    entries: Vec<(String, CategoryStats)>,
}

impl CategoryMap {
    pub fn new() -> Self {
        CategoryMap {
            entries: Vec::new(),
        }
    }

    pub fn entry_mut(&mut self, name: &str) -> &mut CategoryStats {
        let pos = match self.entries.iter().position(|(n, _)| n == name) {
            Some(pos) => pos,
            None => {
                self.entries
                    .push((name.to_string(), CategoryStats::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    pub fn get(&self, name: &str) -> Option<&CategoryStats> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, stats)| stats)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryStats)> {
        self.entries
            .iter()
            .map(|(name, stats)| (name.as_str(), stats))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CategoryMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, stats) in &self.entries {
            map.serialize_entry(name, stats)?;
        }
        map.end()
    }
}

struct CategoryMapVisitor;

impl<'de> Visitor<'de> for CategoryMapVisitor {
    type Value = CategoryMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of category names to stats")
    }

    fn visit_map<A>(self, mut access: A) -> Result<CategoryMap, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::new();
        while let Some((name, stats)) = access.next_entry::<String, CategoryStats>()? {
            entries.push((name, stats));
        }
        Ok(CategoryMap { entries })
    }
}

impl<'de> Deserialize<'de> for CategoryMap {
    fn deserialize<D>(deserializer: D) -> Result<CategoryMap, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CategoryMapVisitor)
    }
}

/// Derived counts; always recomputable from the test cases, never an
/// independent source of truth.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Summary {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub by_category: CategoryMap,
}

/// The complete, immutable record of one harness run.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ResultSet {
    pub timestamp: String,
    pub summary: Summary,
    pub test_cases: Vec<TestCase>,
}

impl ResultSet {
    /// Writes the artifact exactly once at the end of a run.
    pub fn save(&self, path: &Path) -> Result<(), HarnessError> {
        let json = serde_json::to_string_pretty(self).map_err(|err| HarnessError::Malformed {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        std::fs::write(path, json).map_err(|err| HarnessError::io(path, err))
    }

    pub fn load(path: &Path) -> Result<ResultSet, HarnessError> {
        let text = std::fs::read_to_string(path).map_err(|err| HarnessError::io(path, err))?;
        serde_json::from_str(&text).map_err(|err| HarnessError::Malformed {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_map_preserves_first_seen_order() {
        let mut map = CategoryMap::new();
        map.entry_mut("Severity Tests").total += 1;
        map.entry_mut("Edge Cases").total += 1;
        map.entry_mut("Severity Tests").passed += 1;
        let order: Vec<&str> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["Severity Tests", "Edge Cases"]);
        assert_eq!(map.get("Severity Tests").unwrap().total, 1);
    }

    #[test]
    fn category_map_round_trips_through_json() {
        let mut map = CategoryMap::new();
        map.entry_mut("b").total = 2;
        map.entry_mut("a").total = 1;
        let json = serde_json::to_string(&map).unwrap();
        // Serialized in insertion order, not alphabetical.
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
        let back: CategoryMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn skipped_flag_defaults_to_false_on_older_artifacts() {
        let tc: TestCase = serde_json::from_value(json!({
            "name": "t1",
            "category": "c",
            "payload": {},
            "duration_ms": 12,
            "passed": true
        }))
        .unwrap();
        assert!(!tc.skipped);
        assert!(tc.error.is_none());
    }

    #[test]
    fn result_set_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_results.json");
        let result_set = ResultSet {
            timestamp: "2025-01-03T10:00:00Z".to_string(),
            summary: Summary::default(),
            test_cases: vec![TestCase {
                name: "roundtrip".to_string(),
                category: "io".to_string(),
                payload: json!({"chunks": []}),
                expected: None,
                actual: None,
                duration_ms: 0,
                passed: true,
                skipped: false,
                error: None,
            }],
        };
        result_set.save(&path).unwrap();
        let loaded = ResultSet::load(&path).unwrap();
        assert_eq!(loaded.test_cases.len(), 1);
        assert_eq!(loaded.test_cases[0].name, "roundtrip");
    }

    #[test]
    fn load_missing_artifact_fails_with_destination() {
        let err = ResultSet::load(Path::new("/nonexistent/test_results.json")).unwrap_err();
        match err {
            HarnessError::Io { destination, .. } => {
                assert!(destination.ends_with("test_results.json"));
            }
            other => panic!("expected io error, got {}", other),
        }
    }
}
