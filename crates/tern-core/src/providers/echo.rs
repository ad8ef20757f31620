//! Offline backend that answers with the prompt itself.
//!
//! Handy for trying the interface without credentials and for tests that need
//! a deterministic chunk sequence.

use futures_util::future::BoxFuture;
use futures_util::{StreamExt, stream};

use super::shared::{ChatMessage, ChunkStream, Conversation, ProviderResult};
use super::ChatProvider;
use crate::chunk::StreamChunk;

pub struct EchoProvider {
    reasoning: bool,
    conversation: Conversation,
}

impl EchoProvider {
    pub fn new(reasoning: bool) -> Self {
        Self {
            reasoning,
            conversation: Conversation::default(),
        }
    }
}

/// The chunks an echo exchange produces for `prompt`.
fn echo_chunks(prompt: &str, reasoning: bool) -> Vec<StreamChunk> {
    let mut chunks = Vec::new();
    if reasoning {
        let words = prompt.split_whitespace().count();
        chunks.push(StreamChunk::reasoning(format!(
            "Repeating {words} word(s) back."
        )));
    }
    chunks.extend(prompt.split_inclusive(' ').map(StreamChunk::response));
    chunks
}

impl ChatProvider for EchoProvider {
    fn stream_completion(
        &mut self,
        prompt: &str,
    ) -> BoxFuture<'static, ProviderResult<ChunkStream>> {
        self.conversation.begin(prompt);
        let chunks = echo_chunks(prompt, self.reasoning);
        Box::pin(async move { Ok(stream::iter(chunks.into_iter().map(Ok)).boxed()) })
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
        "echo"
    }

    fn supports_reasoning(&self) -> bool {
        true
    }
}
