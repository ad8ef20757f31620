//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tern_core::config::{self, Config};
use tern_core::logging;

mod commands;

#[derive(Parser)]
#[command(name = "tern")]
#[command(version)]
#[command(about = "Streaming chat client for the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Model alias (sonnet, gpt-5, echo, ...) or provider:model
    #[arg(value_name = "MODEL")]
    model: Option<String>,

    /// Config file to use instead of $TERN_HOME/config.toml
    #[arg(long, value_name = "PATH", env = "TERN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the system prompt
    #[arg(short = 'P', long)]
    system_prompt: Option<String>,

    /// Ask reasoning-capable models to think first
    #[arg(short, long, value_name = "BOOL")]
    reasoning: Option<bool>,

    /// Reasoning effort, 1 (minimal) to 4 (high)
    #[arg(
        short = 'e',
        long,
        value_name = "LEVEL",
        value_parser = clap::value_parser!(u8).range(1..=4)
    )]
    reasoning_effort: Option<u8>,

    /// Maximum tokens per response
    #[arg(short = 't', long)]
    max_tokens: Option<u32>,

    /// Built-in theme (dark, light, plain) or path to a theme file
    #[arg(short, long, value_name = "STYLE")]
    style: Option<String>,

    /// Render reasoning text in the transcript
    #[arg(long)]
    show_reasoning: bool,

    /// Open the interactive UI even when a prompt is piped in
    #[arg(long)]
    force_interactive: bool,

    /// OpenAI API key (overrides config and OPENAI_API_KEY)
    #[arg(long, value_name = "KEY")]
    openai_api_key: Option<String>,

    /// Anthropic API key (overrides config and ANTHROPIC_API_KEY)
    #[arg(long, value_name = "KEY")]
    anthropic_api_key: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Print the config file path
    Path,
    /// Write a commented default config file
    Init,
}

impl Cli {
    fn apply_overrides(self, config: &mut Config) {
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(prompt) = self.system_prompt {
            config.system_prompt = prompt;
        }
        if let Some(reasoning) = self.reasoning {
            config.reasoning = reasoning;
        }
        if let Some(level) = self.reasoning_effort {
            config.reasoning_effort = level;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(style) = self.style {
            config.style = style;
        }
        if self.show_reasoning {
            config.show_reasoning = true;
        }
        if let Some(key) = self.openai_api_key {
            config.providers.openai.api_key = Some(key);
        }
        if let Some(key) = self.anthropic_api_key {
            config.providers.anthropic.api_key = Some(key);
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(config::paths::config_path);

    if let Some(Commands::Config { command }) = &cli.command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path(&config_path);
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(&config_path),
        };
    }

    let mut config = Config::load_from(&config_path).context("load config")?;
    let force_interactive = cli.force_interactive;
    cli.apply_overrides(&mut config);

    // held until exit so buffered log lines are flushed
    let _log_guard = logging::init(&config::paths::logs_dir()).context("init logging")?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { commands::chat::run(&config, force_interactive).await })
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "tern",
            "gpt-5",
            "-P",
            "be brief",
            "-r",
            "false",
            "-e",
            "2",
            "-t",
            "512",
            "-s",
            "light",
            "--show-reasoning",
            "--openai-api-key",
            "sk-test",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.model, "gpt-5");
        assert_eq!(config.system_prompt, "be brief");
        assert!(!config.reasoning);
        assert_eq!(config.reasoning_effort, 2);
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.style, "light");
        assert!(config.show_reasoning);
        assert_eq!(config.providers.openai.api_key.as_deref(), Some("sk-test"));
        assert!(config.providers.anthropic.api_key.is_none());
    }

    #[test]
    fn test_reasoning_effort_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["tern", "-e", "5"]).is_err());
    }

    #[test]
    fn test_config_subcommand_parses() {
        let cli = Cli::parse_from(["tern", "config", "path"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: ConfigCommands::Path
            })
        ));
    }
}
