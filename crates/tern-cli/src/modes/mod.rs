//! Runtime execution modes.
//!
//! - `exec`: piped prompt, response text on stdout
//! - `tui`: full-screen interactive chat

pub mod exec;

pub use tern_tui::run_interactive_chat;
