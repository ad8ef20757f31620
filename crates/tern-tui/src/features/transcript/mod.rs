//! Transcript feature: entries, streaming buffers and incremental rendering.

mod accumulator;
mod cache;
mod entry;
pub mod markdown;
mod painter;
mod render;
mod state;
pub mod style;
mod view;
mod wrap;

pub use accumulator::{Drained, Preview, StreamAccumulator};
pub use cache::{LiveTail, TranscriptRenderCache};
pub use entry::Entry;
pub use painter::{EntryPainter, RenderConfig};
pub use render::render_transcript;
pub use state::{Transcript, TranscriptError};
pub use view::TranscriptView;
