//! LLM client for OpenAI-compatible chat-completions endpoints.
//!
//! Groq, OpenAI and Ollama all expose the same `/v1/chat/completions` dialect, so a
//! single blocking client covers every configured backend. The planner only depends
//! on the [`LlmBackend`] capability: given a prompt, return text or signal failure.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, info};

use crate::config::{ConfigError, ConfigResult, LlmSettings};

/// System message sent with every completion request
pub const SYSTEM_MESSAGE: &str = "You are a QA automation assistant.";

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur while talking to the model
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Failed to reach the endpoint
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request took longer than the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint rejected our credentials
    #[error("authentication rejected (HTTP {0})")]
    Unauthorized(u16),

    /// The provider is throttling us
    #[error("rate limited by provider")]
    RateLimited,

    /// Any other non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The body was not a chat-completions response
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// The capability the planner needs from a language model.
pub trait LlmBackend {
    /// Send one prompt and block until the full completion text is available
    fn complete(&self, prompt: &str) -> LlmResult<String>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// Blocking chat-completions client
#[derive(Debug)]
pub struct ChatCompletionsClient {
    settings: LlmSettings,
    http: reqwest::blocking::Client,
}

impl ChatCompletionsClient {
    /// Build a client for the configured backend.
    ///
    /// Fails when the backend needs an API key that is not configured.
    pub fn new(settings: LlmSettings) -> ConfigResult<Self> {
        settings.validate()?;
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        info!(
            "[LLM] Using {} backend with model: {}",
            settings.backend, settings.model
        );
        Ok(Self { settings, http })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.settings.model,
            "messages": [
                { "role": "system", "content": SYSTEM_MESSAGE },
                { "role": "user", "content": prompt }
            ]
        })
    }
}

impl LlmBackend for ChatCompletionsClient {
    fn complete(&self, prompt: &str) -> LlmResult<String> {
        let mut request = self
            .http
            .post(&self.settings.endpoint)
            .json(&self.request_body(prompt));
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        debug!("[LLM] POST {} ({} prompt chars)", self.settings.endpoint, prompt.len());
        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(Duration::from_secs(self.settings.timeout_secs))
            } else {
                LlmError::ConnectionFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        extract_completion_text(&body)
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}

fn classify_status(status: StatusCode, body: String) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Unauthorized(status.as_u16()),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited,
        _ => LlmError::Http {
            status: status.as_u16(),
            body,
        },
    }
}

/// Pull the assistant text out of a chat-completions response.
///
/// Thinking models sometimes leave `content` empty and put the answer in
/// `reasoning_content`; that is used as a fallback.
pub fn extract_completion_text(response: &serde_json::Value) -> LlmResult<String> {
    let message = &response["choices"][0]["message"];
    if message.is_null() {
        return Err(LlmError::InvalidResponse(
            "missing choices[0].message".to_string(),
        ));
    }

    let content = message["content"].as_str().unwrap_or("");
    if !content.is_empty() {
        return Ok(content.to_string());
    }

    Ok(message["reasoning_content"]
        .as_str()
        .unwrap_or("")
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmBackendKind;

    #[test]
    fn test_extract_completion_text() {
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "[]" } }]
        });
        assert_eq!(extract_completion_text(&body).unwrap(), "[]");
    }

    #[test]
    fn test_extract_completion_text_reasoning_fallback() {
        let body = serde_json::json!({
            "choices": [{ "message": { "content": "", "reasoning_content": "thinking" } }]
        });
        assert_eq!(extract_completion_text(&body).unwrap(), "thinking");
    }

    #[test]
    fn test_extract_completion_text_missing_message() {
        let body = serde_json::json!({ "error": "nope" });
        assert!(matches!(
            extract_completion_text(&body),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, String::new()),
            LlmError::Unauthorized(401)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            LlmError::RateLimited
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "upstream".into()),
            LlmError::Http { status: 502, .. }
        ));
    }

    #[test]
    fn test_client_requires_api_key() {
        let settings = LlmSettings::for_backend(LlmBackendKind::OpenAi);
        assert!(ChatCompletionsClient::new(settings).is_err());
    }
}
