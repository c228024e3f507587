use crate::backend::model::{
    BatchIngestResponse, ConversationIngestResponse, EntityDetail, IngestResponse, ProjectStats,
    SearchRequest, SearchResponse,
};
use crate::config::HarnessConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::info;

#[derive(Clone, Debug)]
pub enum HttpError {
    Status(u16, StatusError),
    Io(String),
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum StatusError {
    ClientError(String),
    ServerError(String),
}

impl HttpError {
    pub fn get_message(&self) -> String {
        match self {
            HttpError::Status(code, status_err) => match status_err {
                StatusError::ClientError(msg) => format!("HTTP {}: {}", code, msg),
                StatusError::ServerError(msg) => format!("HTTP {}: {}", code, msg),
            },
            HttpError::Io(msg) => msg.to_string(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpError::Status(code, _) => Some(*code),
            HttpError::Io(_) => None,
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get_message())
    }
}

/// Client for the memory service. Base URL and timeout come from the config
/// object, never from process state.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &HarnessConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn health(&self) -> Result<(), HttpError> {
        self.get_json::<Value>("/innocody/health").await.map(|_| ())
    }

    pub async fn ingest_webhook(&self, payload: &Value) -> Result<IngestResponse, HttpError> {
        self.post_json("/innocody/webhook", payload).await
    }

    pub async fn ingest_webhook_batch(
        &self,
        payloads: &[Value],
    ) -> Result<BatchIngestResponse, HttpError> {
        self.post_json("/innocody/webhook/batch", &payloads).await
    }

    pub async fn ingest_conversation(
        &self,
        payload: &Value,
    ) -> Result<ConversationIngestResponse, HttpError> {
        self.post_json("/ingest/conversation", payload).await
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, HttpError> {
        self.post_json("/search", request).await
    }

    pub async fn project_stats(&self, project_id: &str) -> Result<ProjectStats, HttpError> {
        self.get_json(&format!("/stats/{}", project_id)).await
    }

    pub async fn entity_detail(&self, entity_uuid: &str) -> Result<EntityDetail, HttpError> {
        self.get_json(&format!("/debug/entity/{}", entity_uuid))
            .await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        info!("POST {}", url);
        let result = self.client.post(&url).json(body).send().await;
        Self::handle(result).await
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        info!("GET {}", url);
        let result = self.client.get(&url).send().await;
        Self::handle(result).await
    }

    async fn handle<T>(
        result: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        match result {
            Ok(response) => {
                let status_code = response.status();
                info!("response status: {}", status_code);
                if status_code.is_success() {
                    let text = response
                        .text()
                        .await
                        .map_err(|err| HttpError::Io(err.to_string()))?;
                    serde_json::from_str(&text).map_err(|err| {
                        HttpError::Io(format!("unparseable response body: {}", err))
                    })
                } else if status_code.is_client_error() {
                    let text = response.text().await.unwrap_or_default();
                    Err(HttpError::Status(
                        status_code.as_u16(),
                        StatusError::ClientError(text),
                    ))
                } else {
                    let text = response.text().await.unwrap_or_default();
                    Err(HttpError::Status(
                        status_code.as_u16(),
                        StatusError::ServerError(text),
                    ))
                }
            }
            Err(error) => Err(HttpError::Io(error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_carries_status() {
        let err = HttpError::Status(422, StatusError::ClientError("bad chunk".to_string()));
        assert_eq!(err.get_message(), "HTTP 422: bad chunk");
        assert_eq!(err.status_code(), Some(422));
    }

    #[test]
    fn io_error_has_no_status() {
        let err = HttpError::Io("connection refused".to_string());
        assert_eq!(err.status_code(), None);
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = crate::config::HarnessConfig::builder()
            .base_url("http://localhost:8000/".to_string())
            .build();
        let client = ApiClient::new(&config);
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
