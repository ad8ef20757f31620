//! Provider-agnostic types shared across backends.

use std::fmt;

use anyhow::{Context, Result};
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use serde::Serialize;
use serde_json::Value;

use crate::chunk::StreamChunk;

/// Standard User-Agent header for tern API requests.
pub const USER_AGENT: &str = concat!("tern/", env!("CARGO_PKG_VERSION"));

// Credentials and endpoints

/// Picks the configured key, then `env_var`.
///
/// # Errors
/// Returns an error when neither source provides a key.
pub fn resolve_api_key(
    config_api_key: Option<&str>,
    env_var: &str,
    config_section: &str,
) -> Result<String> {
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    std::env::var(env_var)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .with_context(|| {
            format!("No API key available. Set {env_var} or api_key in [providers.{config_section}].")
        })
}

/// Picks `env_var`, then the configured URL, then `default_url`. Trailing
/// slashes are dropped.
///
/// # Errors
/// Returns an error if the chosen URL does not parse.
pub fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    provider_name: &str,
) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    Ok(default_url.to_string())
}

fn validate_url(url: &str, provider_name: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {provider_name} base URL: {url}"))?;
    Ok(())
}

// Conversation history

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message as sent to the APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Completed turns plus the user turn awaiting its answer.
///
/// A pending turn is committed together with the assistant reply, and only
/// when that reply has text; a failed or empty exchange leaves no trace.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    pending: Option<String>,
}

impl Conversation {
    /// Starts a new turn and returns the messages to send for it.
    pub fn begin(&mut self, prompt: &str) -> Vec<ChatMessage> {
        self.pending = Some(prompt.to_string());
        let mut outgoing = self.messages.clone();
        outgoing.push(ChatMessage::user(prompt));
        outgoing
    }

    /// Resolves the pending turn with the assistant's reply.
    pub fn finish(&mut self, response: &str) {
        let Some(prompt) = self.pending.take() else {
            return;
        };
        if response.is_empty() {
            tracing::debug!("empty response, dropping user turn from history");
            return;
        }
        self.messages.push(ChatMessage::user(prompt));
        self.messages.push(ChatMessage::assistant(response));
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending = None;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

// Errors

/// Error categories for provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Non-2xx response or transport failure
    HttpStatus,
    /// Request or connection timed out
    Timeout,
    /// Malformed stream data
    Parse,
    /// Error event reported inside the stream
    ApiError,
    /// Missing or rejected credentials
    Auth,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::HttpStatus => write!(f, "http_status"),
            ProviderErrorKind::Timeout => write!(f, "timeout"),
            ProviderErrorKind::Parse => write!(f, "parse"),
            ProviderErrorKind::ApiError => write!(f, "api_error"),
            ProviderErrorKind::Auth => write!(f, "auth"),
        }
    }
}

/// Structured provider error.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    /// Shown to the user as the error block text.
    pub message: String,
    /// Raw response body, kept for the log.
    pub details: Option<String>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, lifting `error.message` out of JSON bodies.
    pub fn http_status(status: u16, body: &str) -> Self {
        let kind = if status == 401 || status == 403 {
            ProviderErrorKind::Auth
        } else {
            ProviderErrorKind::HttpStatus
        };
        if let Ok(json) = serde_json::from_str::<Value>(body)
            && let Some(msg) = json
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
        {
            return Self {
                kind,
                message: format!("HTTP {status}: {msg}"),
                details: Some(body.to_string()),
            };
        }
        Self {
            kind,
            message: format!("HTTP {status}"),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Parse, message)
    }

    /// Creates an API error (from a mid-stream error event).
    pub fn api_error(error_type: &str, message: &str) -> Self {
        Self::new(ProviderErrorKind::ApiError, format!("{error_type}: {message}"))
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Stream of chunks for one exchange.
pub type ChunkStream = BoxStream<'static, ProviderResult<StreamChunk>>;

pub(crate) fn classify_reqwest_error(e: &reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::timeout(format!("Connection failed: {e}"))
    } else if e.is_request() {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Request error: {e}"))
    } else {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Network error: {e}"))
    }
}

/// Body bytes of a successful streaming response.
pub(crate) type SseBody = BoxStream<'static, reqwest::Result<Bytes>>;

/// Sends `request` and returns the body stream once the status is a success.
///
/// A trailing blank line is appended so the SSE decoder dispatches a final
/// event that arrived without its separator.
pub(crate) async fn send_streaming(request: reqwest::RequestBuilder) -> ProviderResult<SseBody> {
    let response = request
        .send()
        .await
        .map_err(|e| classify_reqwest_error(&e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "provider rejected request");
        return Err(ProviderError::http_status(status.as_u16(), &body));
    }

    let terminator = stream::once(async { Ok(Bytes::from_static(b"\n\n")) });
    Ok(response.bytes_stream().chain(terminator).boxed())
}
