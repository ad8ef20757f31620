//! Piped mode: one exchange, response text streamed to stdout.
//!
//! Reasoning chunks are logged but never printed. Error chunks are collected
//! and reported once the exchange closes so the caller can exit non-zero.

use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use tern_core::chunk::ChunkKind;
use tern_core::exchange::Exchange;
use tern_core::providers::ChatProvider;

pub async fn run(provider: &mut dyn ChatProvider, prompt: &str) -> Result<()> {
    tracing::info!(
        model = %provider.model_id(),
        prompt_bytes = prompt.len(),
        "starting piped exchange"
    );

    let mut exchange = Exchange::start(provider.stream_completion(prompt));
    let mut stdout = io::stdout();
    let mut response = String::new();
    let mut errors = Vec::new();

    while let Some(chunk) = exchange.next().await {
        match chunk.kind {
            ChunkKind::Response => {
                stdout
                    .write_all(chunk.text.as_bytes())
                    .and_then(|()| stdout.flush())
                    .context("write response to stdout")?;
                response.push_str(&chunk.text);
            }
            ChunkKind::Reasoning => {
                tracing::debug!(bytes = chunk.text.len(), "reasoning chunk");
            }
            ChunkKind::Error => errors.push(chunk.text),
        }
    }

    if !response.is_empty() && !response.ends_with('\n') {
        writeln!(stdout).context("write response to stdout")?;
    }
    provider.finish_exchange(&response);

    tracing::info!(
        response_bytes = response.len(),
        failed = !errors.is_empty(),
        "piped exchange completed"
    );

    if !errors.is_empty() {
        bail!("Error: {}", errors.join("\n"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tern_core::providers::echo::EchoProvider;

    use super::*;

    #[tokio::test]
    async fn test_echo_exchange_commits_history() {
        let mut provider = EchoProvider::new(true);
        run(&mut provider, "hello world").await.unwrap();

        let history = provider.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "hello world");
    }
}
