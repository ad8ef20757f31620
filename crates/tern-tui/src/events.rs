//! Events consumed by the reducer.

use crossterm::event::Event;
use tern_core::chunk::StreamChunk;

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Key, mouse, paste or resize from the terminal.
    Terminal(Event),
    /// A chunk of the exchange in flight.
    Chunk(StreamChunk),
    /// The exchange channel closed.
    StreamClosed,
    /// Once per loop iteration.
    Tick,
}
