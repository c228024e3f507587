use crate::error::HarnessError;
use crate::payload::model::{
    ChatMeta, Chunk, CodeChange, ContextFile, ConversationPayload, Message, ModelResponse,
    ToolCall, WebhookMeta, WebhookPayload,
};
use bon::Builder;
use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn short_uuid() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Payload skeleton with a generated timestamp and empty ordered collections.
/// `base_chat_id` is the chat id prefix before the first `_`, or the whole id
/// when there is no separator.
pub fn build_base(
    request_id: &str,
    project_id: &str,
    chat_id: &str,
    chat_mode: &str,
) -> Result<ConversationPayload, HarnessError> {
    if request_id.is_empty() {
        return Err(HarnessError::InvalidArgument(
            "request_id must not be empty".to_string(),
        ));
    }
    if chat_id.is_empty() {
        return Err(HarnessError::InvalidArgument(
            "chat_id must not be empty".to_string(),
        ));
    }
    let base_chat_id = match chat_id.split_once('_') {
        Some((prefix, _)) => prefix.to_string(),
        None => chat_id.to_string(),
    };
    Ok(ConversationPayload {
        request_id: request_id.to_string(),
        project_id: project_id.to_string(),
        timestamp: now_timestamp(),
        chat_meta: ChatMeta {
            chat_id: chat_id.to_string(),
            base_chat_id,
            request_attempt_id: format!("attempt_{}", short_uuid()),
            chat_mode: chat_mode.to_string(),
        },
        messages: Vec::new(),
        context_files: Vec::new(),
        tool_calls: Vec::new(),
        checkpoints: Vec::new(),
        code_changes: Vec::new(),
        model_response: ModelResponse {
            model: "gpt-4-turbo".to_string(),
            finish_reason: "stop".to_string(),
        },
    })
}

/// Appends a message with a gap-free zero-based sequence. The last-appended
/// message carries the running cumulative token total (previous cumulative
/// plus this message's tokens); earlier messages keep the value they held
/// when they were last.
pub fn add_message(payload: &mut ConversationPayload, role: &str, content_summary: &str, tokens: u64) {
    let sequence = payload.messages.len() as u64;
    let cumulative = payload
        .messages
        .last()
        .map(|last| last.total_tokens)
        .unwrap_or(0)
        + tokens;
    payload.messages.push(Message {
        sequence,
        role: role.to_string(),
        content_summary: content_summary.to_string(),
        timestamp: payload.timestamp.clone(),
        total_tokens: cumulative,
        metadata: serde_json::Map::new(),
    });
}

/// Appends a context-file record. The content fingerprint is derived from the
/// path alone so payloads stay reproducible without touching the filesystem.
pub fn add_context_file(payload: &mut ConversationPayload, file_path: &str, usefulness: f64) {
    payload.context_files.push(ContextFile {
        file_path: file_path.to_string(),
        usefulness,
        content_hash: sha256_hex(file_path),
        source: "vecdb".to_string(),
        symbols: Vec::new(),
    });
}

pub fn add_tool_call(
    payload: &mut ConversationPayload,
    tool_name: &str,
    status: &str,
    execution_time_ms: u64,
) {
    payload.tool_calls.push(ToolCall {
        tool_call_id: format!("call_{}", short_uuid()),
        tool_name: tool_name.to_string(),
        arguments_hash: sha256_hex(&format!("{}:args", tool_name)),
        status: status.to_string(),
        execution_time_ms,
    });
}

fn detect_language(file_path: &str) -> String {
    let table = [
        (".py", "python"),
        (".js", "javascript"),
        (".ts", "typescript"),
        (".go", "go"),
        (".rs", "rust"),
    ];
    for (ext, lang) in table {
        if file_path.ends_with(ext) {
            return lang.to_string();
        }
    }
    "unknown".to_string()
}

/// Parameters for a typed code-change record; defaults mirror an ordinary
/// edit so call sites only spell out what differs.
#[derive(Builder, Clone, Debug)]
pub struct CodeChangeSpec {
    pub file_path: String,
    pub change_summary: String,
    #[builder(default = "modified".to_string())]
    pub change_type: String,
    #[builder(default = "medium".to_string())]
    pub severity: String,
    #[builder(default = 0)]
    pub lines_added: u64,
    #[builder(default = 0)]
    pub lines_removed: u64,
    pub function_name: Option<String>,
    #[builder(default)]
    pub imports: Vec<String>,
    pub language: Option<String>,
}

pub fn make_code_change(spec: CodeChangeSpec) -> CodeChange {
    let language = spec
        .language
        .unwrap_or_else(|| detect_language(&spec.file_path));
    let before_hash =
        sha256_hex(&format!("before:{}:{}", spec.file_path, spec.change_summary))[..16].to_string();
    let after_hash =
        sha256_hex(&format!("after:{}:{}", spec.file_path, spec.change_summary))[..16].to_string();
    let mut name = spec.change_type.clone();
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    CodeChange {
        name: format!("{} {}", name, spec.file_path),
        summary: spec.change_summary.clone(),
        file_path: spec.file_path,
        function_name: spec.function_name,
        change_type: spec.change_type,
        change_summary: spec.change_summary.clone(),
        severity: spec.severity,
        diff_summary: spec.change_summary,
        lines_added: spec.lines_added,
        lines_removed: spec.lines_removed,
        language,
        imports: spec.imports,
        code_before_hash: before_hash,
        code_after_hash: after_hash,
        timestamp: now_timestamp(),
    }
}

/// Single-chunk webhook body, the common case in the suite.
pub fn build_webhook(
    file_before: &str,
    file_after: &str,
    chunk: Chunk,
    project_id: &str,
) -> WebhookPayload {
    WebhookPayload {
        file_before: file_before.to_string(),
        file_after: file_after.to_string(),
        chunks: vec![chunk],
        meta: Some(WebhookMeta {
            chat_id: None,
            project_id: project_id.to_string(),
        }),
    }
}
