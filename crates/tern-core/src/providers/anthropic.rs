//! Anthropic Messages API backend.

use anyhow::Result;
use eventsource_stream::Eventsource;
use futures_util::future::{self, BoxFuture};
use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use super::shared::{
    ChatMessage, ChunkStream, Conversation, ProviderError, ProviderResult, USER_AGENT,
    resolve_api_key, resolve_base_url, send_streaming,
};
use super::{ChatProvider, GenerationSettings, ModelSpec};
use crate::chunk::StreamChunk;
use crate::config::ProviderConfig;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";
/// Smallest thinking budget the API accepts.
const MIN_THINKING_BUDGET: u32 = 1024;

/// Streams completions from `/v1/messages`.
pub struct AnthropicProvider {
    spec: ModelSpec,
    settings: GenerationSettings,
    api_key: String,
    base_url: String,
    http: reqwest::Client,
    conversation: Conversation,
}

impl AnthropicProvider {
    /// # Errors
    /// Fails when no API key is available or the base URL is invalid.
    pub fn from_config(
        spec: ModelSpec,
        settings: GenerationSettings,
        config: &ProviderConfig,
    ) -> Result<Self> {
        let api_key =
            resolve_api_key(config.effective_api_key(), "ANTHROPIC_API_KEY", "anthropic")?;
        let base_url = resolve_base_url(
            config.effective_base_url(),
            "ANTHROPIC_BASE_URL",
            DEFAULT_BASE_URL,
            "Anthropic",
        )?;
        Ok(Self::with_endpoint(spec, settings, api_key, base_url))
    }

    /// Builds a provider for an already resolved key and base URL.
    pub(crate) fn with_endpoint(
        spec: ModelSpec,
        settings: GenerationSettings,
        api_key: String,
        base_url: String,
    ) -> Self {
        Self {
            spec,
            settings,
            api_key,
            base_url,
            http: reqwest::Client::new(),
            conversation: Conversation::default(),
        }
    }

    fn build_request(&self, messages: Vec<ChatMessage>) -> MessagesRequest {
        let thinking_enabled = self.settings.reasoning && self.spec.supports_reasoning;
        let (max_tokens, thinking) = token_limits(self.settings.max_tokens, thinking_enabled);
        let system = self.settings.system_prompt.trim();
        MessagesRequest {
            model: self.spec.id.clone(),
            max_tokens,
            stream: true,
            system: (!system.is_empty()).then(|| system.to_string()),
            messages,
            thinking,
        }
    }
}

/// Returns the request's `max_tokens` and thinking config.
///
/// Thinking tokens count against `max_tokens`, so the limit grows to leave
/// room for the answer on top of the budget.
fn token_limits(max_tokens: u32, thinking: bool) -> (u32, Option<ThinkingConfig>) {
    if !thinking {
        return (max_tokens, None);
    }
    let budget = max_tokens.max(MIN_THINKING_BUDGET);
    let limit = if max_tokens <= MIN_THINKING_BUDGET {
        2 * MIN_THINKING_BUDGET
    } else {
        max_tokens.saturating_mul(2)
    };
    (
        limit,
        Some(ThinkingConfig {
            kind: "enabled",
            budget_tokens: budget,
        }),
    )
}

impl ChatProvider for AnthropicProvider {
    fn stream_completion(
        &mut self,
        prompt: &str,
    ) -> BoxFuture<'static, ProviderResult<ChunkStream>> {
        let messages = self.conversation.begin(prompt);
        let body = self.build_request(messages);
        let url = format!("{}{}", self.base_url, MESSAGES_PATH);
        tracing::debug!(
            %url,
            model = %body.model,
            thinking = body.thinking.is_some(),
            "messages request"
        );

        let request = self
            .http
            .post(url)
            .headers(build_headers(&self.api_key))
            .json(&body);

        Box::pin(async move {
            let sse = send_streaming(request).await?;
            Ok(chunk_stream(sse))
        })
    }

    fn finish_exchange(&mut self, response: &str) {
        self.conversation.finish(response);
    }

    fn clear_history(&mut self) {
        self.conversation.clear();
    }

    fn history(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    fn model_id(&self) -> &str {
        &self.spec.id
    }

    fn supports_reasoning(&self) -> bool {
        self.spec.supports_reasoning
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
struct ThinkingConfig {
    #[serde(rename = "type")]
    kind: &'static str,
    budget_tokens: u32,
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-api-key",
        HeaderValue::from_str(api_key).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
    headers.insert("accept", HeaderValue::from_static("text/event-stream"));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("user-agent", HeaderValue::from_static(USER_AGENT));
    headers
}

fn chunk_stream<S, E>(body: S) -> ChunkStream
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Send + Unpin + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    body.eventsource()
        .filter_map(|event| {
            future::ready(match event {
                Ok(event) => parse_event_data(&event.data),
                Err(e) => Some(Err(ProviderError::parse(format!("SSE stream error: {e}")))),
            })
        })
        .boxed()
}

/// Maps one event payload to a chunk; bookkeeping events yield nothing.
fn parse_event_data(data: &str) -> Option<ProviderResult<StreamChunk>> {
    let data = data.trim();
    if data.is_empty() {
        return None;
    }
    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => return Some(Err(ProviderError::parse(format!("Invalid event: {e}")))),
    };

    match value.get("type").and_then(Value::as_str)? {
        "content_block_delta" => {
            let delta = value.get("delta")?;
            let chunk = match delta.get("type").and_then(Value::as_str)? {
                "text_delta" => StreamChunk::response(delta.get("text")?.as_str()?),
                "thinking_delta" => StreamChunk::reasoning(delta.get("thinking")?.as_str()?),
                _ => return None,
            };
            (!chunk.text.is_empty()).then_some(Ok(chunk))
        }
        "error" => {
            let error = value.get("error");
            let error_type = error
                .and_then(|e| e.get("type"))
                .and_then(Value::as_str)
                .unwrap_or("error");
            let message = error
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            Some(Err(ProviderError::api_error(error_type, message)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::chunk::ChunkKind;
    use crate::config::ReasoningEffort;
    use crate::providers::{ProviderErrorKind, ProviderKind};

    fn provider(base_url: &str, max_tokens: u32) -> AnthropicProvider {
        let spec = ModelSpec {
            provider: ProviderKind::Anthropic,
            id: "claude-sonnet-4-5".to_string(),
            supports_reasoning: true,
        };
        let settings = GenerationSettings {
            system_prompt: "be brief".to_string(),
            max_tokens,
            reasoning: true,
            effort: ReasoningEffort::default(),
        };
        AnthropicProvider::with_endpoint(spec, settings, "test-key".into(), base_url.into())
    }

    fn sse_event(event: &str, data: &str) -> String {
        format!("event: {event}\ndata: {data}\n\n")
    }

    #[test]
    fn test_explicit_endpoint_ignores_base_url_env() {
        // SAFETY: no other test in this crate reads ANTHROPIC_BASE_URL.
        unsafe { std::env::set_var("ANTHROPIC_BASE_URL", "http://127.0.0.1:9/env") };

        let explicit = provider("http://127.0.0.1:4010", 1024);
        let spec = explicit.spec.clone();
        let settings = explicit.settings.clone();
        let config = ProviderConfig {
            api_key: Some("test-key".to_string()),
            base_url: Some("http://127.0.0.1:4010".to_string()),
        };
        let resolved = AnthropicProvider::from_config(spec, settings, &config);

        unsafe { std::env::remove_var("ANTHROPIC_BASE_URL") };

        assert_eq!(explicit.base_url, "http://127.0.0.1:4010");
        assert_eq!(resolved.unwrap().base_url, "http://127.0.0.1:9/env");
    }

    #[test]
    fn test_token_limits_small_budget() {
        let (limit, thinking) = token_limits(512, true);
        assert_eq!(limit, 2048);
        assert_eq!(thinking.unwrap().budget_tokens, 1024);
    }

    #[test]
    fn test_token_limits_doubles_large_budget() {
        let (limit, thinking) = token_limits(4096, true);
        assert_eq!(limit, 8192);
        assert_eq!(thinking.unwrap().budget_tokens, 4096);

        let (limit, thinking) = token_limits(4096, false);
        assert_eq!(limit, 4096);
        assert!(thinking.is_none());
    }

    #[test]
    fn test_parse_deltas() {
        let text = parse_event_data(
            r#"{"type":"content_block_delta","index":1,"delta":{"type":"text_delta","text":"Hi"}}"#,
        );
        assert_eq!(text.unwrap().unwrap(), StreamChunk::response("Hi"));

        let thinking = parse_event_data(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"hmm"}}"#,
        );
        assert_eq!(thinking.unwrap().unwrap(), StreamChunk::reasoning("hmm"));

        assert!(parse_event_data(r#"{"type":"message_stop"}"#).is_none());
        assert!(
            parse_event_data(
                r#"{"type":"content_block_delta","delta":{"type":"signature_delta","signature":"x"}}"#
            )
            .is_none()
        );
    }

    #[test]
    fn test_parse_error_event() {
        let err = parse_event_data(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        )
        .unwrap()
        .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::ApiError);
        assert_eq!(err.to_string(), "overloaded_error: Overloaded");
    }

    #[tokio::test]
    async fn test_stream_completion_with_thinking() {
        let server = MockServer::start().await;
        let body = [
            sse_event("message_start", r#"{"type":"message_start","message":{}}"#),
            sse_event(
                "content_block_delta",
                r#"{"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"thinking..."}}"#,
            ),
            sse_event(
                "content_block_delta",
                r#"{"type":"content_block_delta","index":1,"delta":{"type":"text_delta","text":"Hi"}}"#,
            ),
            sse_event(
                "content_block_delta",
                r#"{"type":"content_block_delta","index":1,"delta":{"type":"text_delta","text":" there"}}"#,
            ),
            sse_event("message_stop", r#"{"type":"message_stop"}"#),
        ]
        .concat();

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", API_VERSION))
            .and(body_partial_json(serde_json::json!({
                "system": "be brief",
                "max_tokens": 2048,
                "thinking": {"type": "enabled", "budget_tokens": 1024}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let mut p = provider(&server.uri(), 1024);
        let stream = p.stream_completion("hello").await.unwrap();
        let chunks: Vec<_> = stream.map(Result::unwrap).collect().await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].kind, ChunkKind::Reasoning);
        assert_eq!(chunks[1].text, "Hi");
        assert_eq!(chunks[2].text, " there");
    }

    #[tokio::test]
    async fn test_mid_stream_error_is_yielded_and_stream_continues() {
        let server = MockServer::start().await;
        let body = [
            sse_event(
                "error",
                r#"{"type":"error","error":{"type":"rate_limit_error","message":"rate limited"}}"#,
            ),
            sse_event("message_stop", r#"{"type":"message_stop"}"#),
        ]
        .concat();
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let mut p = provider(&server.uri(), 1024);
        let stream = p.stream_completion("hello").await.unwrap();
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items.len(), 1);
        let Err(err) = &items[0] else {
            panic!("expected an error item");
        };
        assert_eq!(err.to_string(), "rate_limit_error: rate limited");
    }
}
