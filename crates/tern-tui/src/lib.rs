//! Full-screen chat client.

pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod theme;
pub mod update;

use std::io::{IsTerminal, stdout};

use anyhow::{Context, Result, bail};
pub use features::{input, transcript};
pub use runtime::TuiRuntime;
use tern_core::config::Config;
use tern_core::providers::ChatProvider;

use crate::state::AppState;
use crate::theme::Theme;
use crate::transcript::RenderConfig;

/// Runs the interactive chat until the user quits.
///
/// `initial_prompt` is submitted before the first frame. The theme is
/// resolved before the terminal is touched so a bad style id fails cleanly.
/// Must be called from within a tokio runtime.
pub fn run_interactive_chat(
    config: &Config,
    provider: Box<dyn ChatProvider>,
    initial_prompt: Option<String>,
) -> Result<()> {
    if !stdout().is_terminal() {
        bail!("Interactive mode requires a terminal on stdout.");
    }

    let theme = Theme::resolve(&config.style)
        .with_context(|| format!("Failed to load style '{}'", config.style))?;
    let layout = RenderConfig {
        show_reasoning: config.show_reasoning,
        ..RenderConfig::default()
    };
    let state = AppState::new(theme, layout, provider.model_id());

    let mut runtime = TuiRuntime::new(state, provider);
    if let Some(prompt) = initial_prompt.filter(|p| !p.trim().is_empty()) {
        runtime.submit(prompt.trim().to_string());
    }
    runtime.run()
}
