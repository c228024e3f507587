use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Conversation envelope accepted by `POST /ingest/conversation`. Collections
/// are ordered; insertion order is what the backend sees.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversationPayload {
    pub request_id: String,
    pub project_id: String,
    pub timestamp: String,
    pub chat_meta: ChatMeta,
    pub messages: Vec<Message>,
    pub context_files: Vec<ContextFile>,
    pub tool_calls: Vec<ToolCall>,
    pub checkpoints: Vec<Value>,
    pub code_changes: Vec<CodeChange>,
    pub model_response: ModelResponse,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChatMeta {
    pub chat_id: String,
    pub base_chat_id: String,
    pub request_attempt_id: String,
    pub chat_mode: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub sequence: u64,
    pub role: String,
    pub content_summary: String,
    pub timestamp: String,
    /// Running cumulative total on the last-appended message; earlier
    /// messages keep the value they had when they were last.
    pub total_tokens: u64,
    pub metadata: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ContextFile {
    pub file_path: String,
    pub usefulness: f64,
    pub content_hash: String,
    pub source: String,
    pub symbols: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ToolCall {
    pub tool_call_id: String,
    pub tool_name: String,
    pub arguments_hash: String,
    pub status: String,
    pub execution_time_ms: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CodeChange {
    pub name: String,
    pub summary: String,
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    pub change_type: String,
    pub change_summary: String,
    pub severity: String,
    pub diff_summary: String,
    pub lines_added: u64,
    pub lines_removed: u64,
    pub language: String,
    pub imports: Vec<String>,
    pub code_before_hash: String,
    pub code_after_hash: String,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModelResponse {
    pub model: String,
    pub finish_reason: String,
}

/// Code-change webhook body for `POST /innocody/webhook`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WebhookPayload {
    pub file_before: String,
    pub file_after: String,
    pub chunks: Vec<Chunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<WebhookMeta>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Chunk {
    pub file_name: String,
    pub file_action: String,
    pub line1: u64,
    pub line2: u64,
    pub lines_remove: String,
    pub lines_add: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WebhookMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    pub project_id: String,
}
