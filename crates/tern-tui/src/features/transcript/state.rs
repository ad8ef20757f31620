//! Transcript state: completed entries, the exchange in flight, and the
//! caches that depend on them.

use std::fmt;

use tern_core::chunk::StreamChunk;

use super::accumulator::StreamAccumulator;
use super::cache::TranscriptRenderCache;
use super::entry::Entry;
use super::markdown::MarkdownStyle;
use super::painter::{EntryPainter, RenderConfig};
use super::view::TranscriptView;
use crate::features::input::HistoryTraverser;

/// Misuse of the prompt/response pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptError {
    /// `add_prompt` while an earlier prompt has no response yet.
    ExchangeInFlight,
    /// `add_response` with no prompt waiting for one.
    NoExchangeInFlight,
}

impl fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptError::ExchangeInFlight => {
                write!(f, "an exchange is already in flight")
            }
            TranscriptError::NoExchangeInFlight => write!(f, "no exchange is in flight"),
        }
    }
}

impl std::error::Error for TranscriptError {}

#[derive(Debug)]
pub struct Transcript {
    entries: Vec<Entry>,
    completed: usize,
    stream: StreamAccumulator,
    cache: TranscriptRenderCache,
    painter: EntryPainter,
    history: HistoryTraverser,
}

impl Transcript {
    pub fn new(markdown: MarkdownStyle, config: RenderConfig) -> Self {
        Self {
            entries: Vec::new(),
            completed: 0,
            stream: StreamAccumulator::default(),
            cache: TranscriptRenderCache::default(),
            painter: EntryPainter::new(markdown, config),
            history: HistoryTraverser::default(),
        }
    }

    /// Starts a new entry for `prompt`.
    pub fn add_prompt(&mut self, prompt: impl Into<String>) -> Result<(), TranscriptError> {
        if self.is_streaming() {
            return Err(TranscriptError::ExchangeInFlight);
        }
        self.entries.push(Entry::new(prompt));
        Ok(())
    }

    /// Buffers a streamed chunk for the entry in flight.
    pub fn push_chunk(&mut self, chunk: &StreamChunk) {
        self.stream.push(chunk);
    }

    /// Completes the entry in flight with everything streamed for it.
    pub fn add_response(&mut self) -> Result<&Entry, TranscriptError> {
        if !self.is_streaming() {
            return Err(TranscriptError::NoExchangeInFlight);
        }
        let drained = self.stream.drain();
        let entry = &mut self.entries[self.completed];
        entry.complete(drained);
        self.completed += 1;
        Ok(entry)
    }

    /// Renders the transcript at `width`, reusing cached lines where possible.
    pub fn render(&mut self, width: usize) -> TranscriptView<'_> {
        let live = self
            .entries
            .get(self.completed)
            .map(|entry| (entry, &self.stream));
        self.cache.render(
            &self.entries[..self.completed],
            live,
            width,
            &mut self.painter,
        )
    }

    /// Drops every entry along with the state derived from them.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.completed = 0;
        self.stream.clear();
        self.cache.reset();
        self.history.reset();
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed
    }

    pub fn is_streaming(&self) -> bool {
        self.entries.len() > self.completed
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn stream(&self) -> &StreamAccumulator {
        &self.stream
    }

    /// Recalls the previous prompt, keeping `visible` as an edit.
    pub fn history_prev(&mut self, visible: &str) -> Option<String> {
        self.history.prev(self.entries.as_slice(), visible)
    }

    /// Moves toward the most recent prompt, or back to the unsent text.
    pub fn history_next(&mut self, visible: &str) -> Option<String> {
        self.history.next(self.entries.as_slice(), visible)
    }

    pub fn reset_history(&mut self) {
        self.history.reset();
    }

    pub fn is_browsing_history(&self) -> bool {
        self.history.is_browsing()
    }
}
