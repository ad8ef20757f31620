//! Prompt input: editor, history recall and key handling.

mod history;
mod render;
mod state;
mod text_buffer;
mod update;

pub use history::{Cursor, HistoryTraverser, PromptHistory};
pub use render::{input_height, render_input};
pub use state::InputState;
pub use text_buffer::{CursorMove, TextBuffer};
pub use update::{InputAction, handle_key, handle_paste};
