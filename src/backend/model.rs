use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of `POST /innocody/webhook`. Fields the backend may omit are
/// optional here; a missing field stays missing instead of defaulting.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct IngestResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingested_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episode_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Response of `POST /innocody/webhook/batch`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BatchIngestResponse {
    pub status: String,
    pub total_payloads: u64,
    pub total_chunks: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episode_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<String>,
}

/// Response of `POST /ingest/conversation`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversationIngestResponse {
    pub status: String,
    pub request_uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes_created: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SearchRequest {
    pub query: String,
    pub group_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_ago: Option<u64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SearchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Aggregate counts from `GET /stats/{project_id}`. The backend returns a
/// property map whose keys vary with graph contents.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProjectStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Per-entity property map from `GET /debug/entity/{uuid}`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EntityDetail {
    pub uuid: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}
