//! The unit of data flowing from a provider to the UI.

/// What a streamed piece of text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Model thinking shown before (or instead of) the answer.
    Reasoning,
    /// Answer text.
    Response,
    /// Failure reported by the provider. Does not end the stream.
    Error,
}

/// A tagged fragment of an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub kind: ChunkKind,
    pub text: String,
}

impl StreamChunk {
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Reasoning,
            text: text.into(),
        }
    }

    pub fn response(text: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Response,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Error,
            text: text.into(),
        }
    }
}
