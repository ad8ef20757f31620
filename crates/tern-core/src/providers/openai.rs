//! OpenAI-compatible Chat Completions backend.

use anyhow::Result;
use eventsource_stream::Eventsource;
use futures_util::future::BoxFuture;
use futures_util::{Stream, StreamExt, stream};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use super::shared::{
    ChatMessage, ChunkStream, Conversation, ProviderError, ProviderResult, Role, USER_AGENT,
    resolve_api_key, resolve_base_url, send_streaming,
};
use super::{ChatProvider, GenerationSettings, ModelSpec};
use crate::chunk::StreamChunk;
use crate::config::ProviderConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Streams completions from `/chat/completions`.
pub struct OpenAiProvider {
    spec: ModelSpec,
    settings: GenerationSettings,
    api_key: String,
    base_url: String,
    http: reqwest::Client,
    conversation: Conversation,
}

impl OpenAiProvider {
    /// # Errors
    /// Fails when no API key is available or the base URL is invalid.
    pub fn from_config(
        spec: ModelSpec,
        settings: GenerationSettings,
        config: &ProviderConfig,
    ) -> Result<Self> {
        let api_key = resolve_api_key(config.effective_api_key(), "OPENAI_API_KEY", "openai")?;
        let base_url = resolve_base_url(
            config.effective_base_url(),
            "OPENAI_BASE_URL",
            DEFAULT_BASE_URL,
            "OpenAI",
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

    fn build_request(&self, messages: Vec<ChatMessage>) -> ChatCompletionRequest {
        let mut all = Vec::with_capacity(messages.len() + 1);
        if !self.settings.system_prompt.trim().is_empty() {
            all.push(ChatMessage {
                role: Role::System,
                content: self.settings.system_prompt.clone(),
            });
        }
        all.extend(messages);

        let reasoning = self.spec.supports_reasoning;
        ChatCompletionRequest {
            model: self.spec.id.clone(),
            stream: true,
            messages: all,
            max_tokens: (!reasoning).then_some(self.settings.max_tokens),
            max_completion_tokens: reasoning.then_some(self.settings.max_tokens),
            reasoning_effort: (reasoning && self.settings.reasoning)
                .then(|| self.settings.effort.label().to_string()),
        }
    }
}

impl ChatProvider for OpenAiProvider {
    fn stream_completion(
        &mut self,
        prompt: &str,
    ) -> BoxFuture<'static, ProviderResult<ChunkStream>> {
        let messages = self.conversation.begin(prompt);
        let body = self.build_request(messages);
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH);
        tracing::debug!(%url, model = %body.model, turns = body.messages.len(), "chat completion request");

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
struct ChatCompletionRequest {
    model: String,
    stream: bool,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );
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
        .flat_map(|event| {
            let items = match event {
                Ok(event) => parse_event_data(&event.data),
                Err(e) => vec![Err(ProviderError::parse(format!("SSE stream error: {e}")))],
            };
            stream::iter(items)
        })
        .boxed()
}

/// Parses one `data:` payload into zero, one or two chunks.
fn parse_event_data(data: &str) -> Vec<ProviderResult<StreamChunk>> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Vec::new();
    }

    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            return vec![Err(ProviderError::parse(format!(
                "Invalid chat completion chunk: {e}"
            )))];
        }
    };

    if let Some(error) = value.get("error") {
        let error_type = error
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("error");
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return vec![Err(ProviderError::api_error(error_type, message))];
    }

    let Some(delta) = value.pointer("/choices/0/delta") else {
        return Vec::new();
    };

    let mut chunks = Vec::new();
    let reasoning = ["reasoning_content", "reasoning"]
        .iter()
        .find_map(|key| delta.get(*key).and_then(Value::as_str))
        .filter(|text| !text.is_empty());
    if let Some(text) = reasoning {
        chunks.push(Ok(StreamChunk::reasoning(text)));
    }
    if let Some(text) = delta
        .get("content")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
    {
        chunks.push(Ok(StreamChunk::response(text)));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::chunk::ChunkKind;
    use crate::config::ReasoningEffort;
    use crate::providers::{ProviderErrorKind, ProviderKind};

    fn settings() -> GenerationSettings {
        GenerationSettings {
            system_prompt: "be brief".to_string(),
            max_tokens: 256,
            reasoning: true,
            effort: ReasoningEffort::new(2),
        }
    }

    fn provider(base_url: &str, model: &str, supports_reasoning: bool) -> OpenAiProvider {
        let spec = ModelSpec {
            provider: ProviderKind::OpenAI,
            id: model.to_string(),
            supports_reasoning,
        };
        OpenAiProvider::with_endpoint(spec, settings(), "test-key".into(), base_url.into())
    }

    fn sse_body(events: &[&str]) -> String {
        events.iter().map(|e| format!("data: {e}\n\n")).collect()
    }

    #[test]
    fn test_parse_content_and_reasoning_delta() {
        let chunks = parse_event_data(
            r#"{"choices":[{"delta":{"reasoning_content":"hmm","content":"Hi"}}]}"#,
        );
        let chunks: Vec<_> = chunks.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            chunks,
            vec![StreamChunk::reasoning("hmm"), StreamChunk::response("Hi")]
        );
    }

    #[test]
    fn test_parse_skips_done_and_empty_deltas() {
        assert!(parse_event_data("[DONE]").is_empty());
        assert!(parse_event_data(r#"{"choices":[{"delta":{"content":""}}]}"#).is_empty());
        assert!(parse_event_data(r#"{"choices":[]}"#).is_empty());
    }

    #[test]
    fn test_parse_error_object() {
        let chunks = parse_event_data(r#"{"error":{"type":"rate_limit","message":"slow down"}}"#);
        let err = chunks.into_iter().next().unwrap().unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::ApiError);
        assert_eq!(err.to_string(), "rate_limit: slow down");
    }

    #[test]
    fn test_request_uses_completion_tokens_for_reasoning_models() {
        let p = provider("http://localhost:1", "o4-mini", true);
        let body = serde_json::to_value(p.build_request(vec![ChatMessage::user("hi")])).unwrap();
        assert_eq!(body["max_completion_tokens"], 256);
        assert_eq!(body["reasoning_effort"], "low");
        assert!(body.get("max_tokens").is_none());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_request_plain_model_has_no_effort() {
        let p = provider("http://localhost:1", "gpt-4o-mini", false);
        let body = serde_json::to_value(p.build_request(vec![ChatMessage::user("hi")])).unwrap();
        assert_eq!(body["max_tokens"], 256);
        assert!(body.get("reasoning_effort").is_none());
    }

    #[tokio::test]
    async fn test_stream_completion_yields_chunks() {
        let server = MockServer::start().await;
        let body = sse_body(&[
            r#"{"choices":[{"delta":{"reasoning":"thinking..."}}]}"#,
            r#"{"choices":[{"delta":{"content":"Hi"}}]}"#,
            r#"{"choices":[{"delta":{"content":" there"}}]}"#,
            "[DONE]",
        ]);
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({"model": "o3", "stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let mut p = provider(&server.uri(), "o3", true);
        let stream = p.stream_completion("hello").await.unwrap();
        let chunks: Vec<_> = stream.map(Result::unwrap).collect().await;

        assert_eq!(chunks[0].kind, ChunkKind::Reasoning);
        let response: String = chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Response)
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(response, "Hi there");

        p.finish_exchange(&response);
        assert_eq!(p.history().len(), 2);
    }

    #[tokio::test]
    async fn test_stream_completion_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_string(r#"{"error":{"message":"rate limited"}}"#),
            )
            .mount(&server)
            .await;

        let mut p = provider(&server.uri(), "gpt-4o-mini", false);
        let Err(err) = p.stream_completion("hello").await else {
            panic!("expected an HTTP error");
        };
        assert_eq!(err.to_string(), "HTTP 429: rate limited");

        p.finish_exchange("");
        assert!(p.history().is_empty());
    }
}
