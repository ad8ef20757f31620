use tern_core::chunk::{ChunkKind, StreamChunk};

/// Text drained from a finished exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drained {
    pub reasoning: String,
    pub response: String,
    pub error: String,
}

/// Scratch buffers for the exchange currently streaming.
#[derive(Debug, Clone, Default)]
pub struct StreamAccumulator {
    reasoning: String,
    response: String,
    error: String,
}

impl StreamAccumulator {
    /// Routes a chunk to its buffer. Error chunks replace any earlier error.
    pub fn push(&mut self, chunk: &StreamChunk) {
        match chunk.kind {
            ChunkKind::Reasoning => self.append_reasoning(&chunk.text),
            ChunkKind::Response => self.append_response(&chunk.text),
            ChunkKind::Error => self.set_error(&chunk.text),
        }
    }

    pub fn append_reasoning(&mut self, text: &str) {
        self.reasoning.push_str(text);
    }

    pub fn append_response(&mut self, text: &str) {
        self.response.push_str(text);
    }

    pub fn set_error(&mut self, text: &str) {
        text.clone_into(&mut self.error);
    }

    /// Bytes buffered across reasoning and response.
    pub fn len(&self) -> usize {
        self.reasoning.len() + self.response.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    /// Text to show while streaming: the response once it has started,
    /// the reasoning until then.
    pub fn preview(&self) -> Preview<'_> {
        if self.response.is_empty() {
            Preview::Reasoning(&self.reasoning)
        } else {
            Preview::Response(&self.response)
        }
    }

    /// Takes all buffered text, leaving the accumulator empty.
    pub fn drain(&mut self) -> Drained {
        Drained {
            reasoning: std::mem::take(&mut self.reasoning),
            response: std::mem::take(&mut self.response),
            error: std::mem::take(&mut self.error),
        }
    }

    pub fn clear(&mut self) {
        self.drain();
    }
}

/// Which buffer [`StreamAccumulator::preview`] selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preview<'a> {
    Reasoning(&'a str),
    Response(&'a str),
}
