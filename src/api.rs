//! HTTP client for the studio backend and the classification of its replies.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::AiAction;

pub const RUN_PATH: &str = "/api/code/run_python";
pub const GENERATE_PATH: &str = "/api/ai/generate";

const RUN_FALLBACK_ERROR: &str = "Failed to execute code";
const AI_FALLBACK_ERROR: &str = "Failed to get AI response";
const RUN_EMPTY_OUTPUT: &str = "Code executed successfully!";
const AI_EMPTY_REPLY: &str = "AI response received.";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub code: String,
    pub inputs: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AiRequest {
    pub action: AiAction,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct RunResponse {
    output: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct AiResponse {
    // The chat route answers under `text`
    #[serde(alias = "text")]
    response: Option<String>,
    code: Option<String>,
    error: Option<String>,
}

/// A successful AI reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiReply {
    /// Text to show: `response`, else `code`, else an acknowledgement
    pub text: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No response at all
    #[error("{0}")]
    Transport(String),
    /// Non-success HTTP status
    #[error("{message}")]
    Http { status: u16, message: String },
    /// Success status, but the payload carries an `error` field
    #[error("{0}")]
    Application(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn run_code(&self, request: &RunRequest) -> Result<String, GatewayError>;
    async fn generate(&self, request: &AiRequest) -> Result<AiReply, GatewayError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<(StatusCode, String), GatewayError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok((status, text))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn run_code(&self, request: &RunRequest) -> Result<String, GatewayError> {
        tracing::debug!(inputs = request.inputs.len(), "POST {}", RUN_PATH);
        let (status, body) = self.post(RUN_PATH, request).await?;
        classify_run(status, &body)
    }

    async fn generate(&self, request: &AiRequest) -> Result<AiReply, GatewayError> {
        tracing::debug!(action = request.action.as_str(), "POST {}", GENERATE_PATH);
        let (status, body) = self.post(GENERATE_PATH, request).await?;
        classify_ai(status, &body)
    }
}

/// Failure-status bodies that are not JSON fall back to the generic message.
fn http_error(status: StatusCode, server_error: Option<String>, fallback: &str) -> GatewayError {
    GatewayError::Http {
        status: status.as_u16(),
        message: server_error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    }
}

pub fn classify_run(status: StatusCode, body: &str) -> Result<String, GatewayError> {
    if !status.is_success() {
        let parsed: RunResponse = serde_json::from_str(body).unwrap_or_default();
        return Err(http_error(status, parsed.error, RUN_FALLBACK_ERROR));
    }

    let parsed: RunResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;

    if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
        return Err(GatewayError::Application(error));
    }

    Ok(parsed
        .output
        .filter(|o| !o.is_empty())
        .unwrap_or_else(|| RUN_EMPTY_OUTPUT.to_string()))
}

pub fn classify_ai(status: StatusCode, body: &str) -> Result<AiReply, GatewayError> {
    if !status.is_success() {
        let parsed: AiResponse = serde_json::from_str(body).unwrap_or_default();
        return Err(http_error(status, parsed.error, AI_FALLBACK_ERROR));
    }

    let parsed: AiResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;

    if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
        return Err(GatewayError::Application(error));
    }

    let code = parsed.code.filter(|c| !c.is_empty());
    let text = parsed
        .response
        .filter(|r| !r.is_empty())
        .or_else(|| code.clone())
        .unwrap_or_else(|| AI_EMPTY_REPLY.to_string());

    Ok(AiReply { text, code })
}
