//! Incremental render cache for the transcript.
//!
//! Completed entries are rendered once per width and appended to a stored
//! buffer. The in-flight entry is rendered fresh on every call and returned
//! alongside the buffer, never stored in it.

use super::accumulator::StreamAccumulator;
use super::entry::Entry;
use super::painter::EntryPainter;
use super::style::StyledLine;
use super::view::TranscriptView;

/// Entry in flight plus what has streamed for it.
pub type LiveTail<'a> = (&'a Entry, &'a StreamAccumulator);

#[derive(Debug, Default)]
pub struct TranscriptRenderCache {
    rendered: Vec<StyledLine>,
    rendered_count: usize,
    last_width: Option<usize>,
}

impl TranscriptRenderCache {
    /// Number of completed entries folded into the buffer.
    pub fn rendered_count(&self) -> usize {
        self.rendered_count
    }

    pub fn last_width(&self) -> Option<usize> {
        self.last_width
    }

    pub fn reset(&mut self) {
        self.rendered.clear();
        self.rendered_count = 0;
        self.last_width = None;
    }

    /// Brings the buffer up to date with `completed` and returns it with the
    /// live tail appended.
    pub fn render<'a>(
        &'a mut self,
        completed: &[Entry],
        live: Option<LiveTail<'_>>,
        width: usize,
        painter: &mut EntryPainter,
    ) -> TranscriptView<'a> {
        if self.last_width != Some(width) || completed.len() < self.rendered_count {
            tracing::debug!(
                width,
                entries = completed.len(),
                "re-rendering transcript"
            );
            self.rendered.clear();
            self.rendered_count = 0;
            self.last_width = Some(width);
        }

        for entry in &completed[self.rendered_count..] {
            painter.paint_entry(entry, width, &mut self.rendered);
        }
        self.rendered_count = completed.len();

        let tail = match live {
            Some((entry, stream)) => painter.paint_live(&entry.prompt, stream, width),
            None => Vec::new(),
        };
        TranscriptView::new(&self.rendered, tail)
    }
}
