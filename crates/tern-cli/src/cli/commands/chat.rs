//! Default command: interactive chat, or a single exchange when stdin is piped.

use std::io::{IsTerminal, Read};

use anyhow::{Context, Result, bail};
use tern_core::config::Config;
use tern_core::providers::build_provider;

use crate::modes;

pub async fn run(config: &Config, force_interactive: bool) -> Result<()> {
    let mut provider = build_provider(config)?;

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return modes::run_interactive_chat(config, provider, None);
    }

    let prompt = read_piped_prompt(&mut stdin)?;
    if force_interactive {
        return modes::run_interactive_chat(config, provider, Some(prompt));
    }
    modes::exec::run(provider.as_mut(), &prompt).await
}

fn read_piped_prompt(stdin: &mut impl Read) -> Result<String> {
    let mut input = String::new();
    stdin
        .read_to_string(&mut input)
        .context("read prompt from stdin")?;
    let prompt = input.trim();
    if prompt.is_empty() {
        bail!("No input provided via pipe");
    }
    Ok(prompt.to_string())
}
