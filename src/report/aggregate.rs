use crate::suite::model::{ResultSet, Summary, TestCase};

/// Closed extension-to-language table with an explicit fallback carrying the
/// unrecognized extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    TypeScriptReact,
    Go,
    Rust,
    Java,
    Sql,
    Markdown,
    Other(String),
}

impl Language {
    pub fn from_extension(ext: &str) -> Language {
        match ext {
            "py" => Language::Python,
            "js" => Language::JavaScript,
            "ts" => Language::TypeScript,
            "tsx" => Language::TypeScriptReact,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "java" => Language::Java,
            "sql" => Language::Sql,
            "md" => Language::Markdown,
            other => Language::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Language::Python => "Python".to_string(),
            Language::JavaScript => "JavaScript".to_string(),
            Language::TypeScript => "TypeScript".to_string(),
            Language::TypeScriptReact => "TypeScript/React".to_string(),
            Language::Go => "Go".to_string(),
            Language::Rust => "Rust".to_string(),
            Language::Java => "Java".to_string(),
            Language::Sql => "SQL".to_string(),
            Language::Markdown => "Markdown".to_string(),
            Language::Other(ext) => format!("Other ({})", ext),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LanguageCount {
    pub language: Language,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PerfStats {
    pub average_ms: f64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub total_ms: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SizeBuckets {
    pub small: u64,
    pub medium: u64,
    pub large: u64,
}

impl SizeBuckets {
    pub fn observations(&self) -> u64 {
        self.small + self.medium + self.large
    }

    /// Whole-percent shares, None when nothing was observed.
    pub fn percentages(&self) -> Option<(u64, u64, u64)> {
        let total = self.observations();
        if total == 0 {
            return None;
        }
        let share = |count: u64| (count as f64 / total as f64 * 100.0).round() as u64;
        Some((share(self.small), share(self.medium), share(self.large)))
    }
}

pub fn summarize(result_set: &ResultSet) -> Summary {
    summarize_cases(&result_set.test_cases)
}

/// Recomputed on every call; the stored summary of an artifact is never
/// trusted over the cases themselves.
pub fn summarize_cases(test_cases: &[TestCase]) -> Summary {
    let mut summary = Summary::default();
    for tc in test_cases {
        summary.total += 1;
        let stats = summary.by_category.entry_mut(&tc.category);
        stats.total += 1;
        if tc.passed {
            summary.passed += 1;
            stats.passed += 1;
        } else {
            summary.failed += 1;
            stats.failed += 1;
        }
    }
    summary
}

/// Duration statistics over measured cases only; `duration_ms == 0` means
/// "not measured" and is excluded. Returns None instead of zero-filled stats
/// when nothing was measured.
pub fn performance_stats(result_set: &ResultSet) -> Option<PerfStats> {
    let durations: Vec<u64> = result_set
        .test_cases
        .iter()
        .map(|tc| tc.duration_ms)
        .filter(|ms| *ms > 0)
        .collect();
    if durations.is_empty() {
        return None;
    }
    let total: u64 = durations.iter().sum();
    Some(PerfStats {
        average_ms: total as f64 / durations.len() as f64,
        min_ms: *durations.iter().min().unwrap_or(&0),
        max_ms: *durations.iter().max().unwrap_or(&0),
        total_ms: total,
    })
}

/// Default extractor: the first payload chunk's file name.
pub fn first_chunk_file(tc: &TestCase) -> Option<String> {
    tc.payload
        .get("chunks")
        .and_then(|chunks| chunks.get(0))
        .and_then(|chunk| chunk.get("file_name"))
        .and_then(|name| name.as_str())
        .map(|name| name.to_string())
}

fn extension_of(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Language histogram over extracted file names, sorted descending by count
/// with ties kept in first-seen order.
pub fn distribution_by_extension<F>(result_set: &ResultSet, extractor: F) -> Vec<LanguageCount>
where
    F: Fn(&TestCase) -> Option<String>,
{
    let mut counts: Vec<LanguageCount> = Vec::new();
    for tc in &result_set.test_cases {
        let Some(file_name) = extractor(tc) else {
            continue;
        };
        let Some(ext) = extension_of(&file_name) else {
            continue;
        };
        let language = Language::from_extension(ext);
        match counts.iter_mut().find(|entry| entry.language == language) {
            Some(entry) => entry.count += 1,
            None => counts.push(LanguageCount { language, count: 1 }),
        }
    }
    // Stable sort keeps first-seen order between equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

fn line_count(text: &str) -> u64 {
    text.lines().count() as u64
}

/// Buckets each case's first chunk by total changed line count:
/// small < 10 <= medium < 50 <= large.
pub fn change_size_buckets(result_set: &ResultSet) -> SizeBuckets {
    let mut buckets = SizeBuckets::default();
    for tc in &result_set.test_cases {
        let Some(chunk) = tc.payload.get("chunks").and_then(|chunks| chunks.get(0)) else {
            continue;
        };
        let added = chunk
            .get("lines_add")
            .and_then(|v| v.as_str())
            .map(line_count)
            .unwrap_or(0);
        let removed = chunk
            .get("lines_remove")
            .and_then(|v| v.as_str())
            .map(line_count)
            .unwrap_or(0);
        let total = added + removed;
        if total < 10 {
            buckets.small += 1;
        } else if total < 50 {
            buckets.medium += 1;
        } else {
            buckets.large += 1;
        }
    }
    buckets
}
