//! Configuration management for tern.
//!
//! Loads configuration from ${TERN_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The embedded default config template.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for tern configuration and data directories.
    //!
    //! TERN_HOME resolution order:
    //! 1. TERN_HOME environment variable (if set)
    //! 2. ~/.config/tern (default)
    //! 3. ./.tern when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the tern home directory.
    pub fn tern_home() -> PathBuf {
        if let Ok(home) = std::env::var("TERN_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".tern"),
            |h| h.join(".config").join("tern"),
        )
    }

    /// `${TERN_HOME}/config.toml`.
    pub fn config_path() -> PathBuf {
        tern_home().join("config.toml")
    }

    /// Returns the directory log files are written to.
    pub fn logs_dir() -> PathBuf {
        tern_home().join("logs")
    }
}

/// How hard a reasoning model should think, from 1 (minimal) to 4 (high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReasoningEffort(u8);

impl ReasoningEffort {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    /// Builds an effort level, clamping out-of-range values.
    pub fn new(level: u8) -> Self {
        Self(level.clamp(Self::MIN, Self::MAX))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Returns the wire label used by OpenAI-compatible APIs.
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "minimal",
            2 => "low",
            3 => "medium",
            _ => "high",
        }
    }
}

impl Default for ReasoningEffort {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

/// `[providers.<name>]` table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProviderConfig {
    /// Takes precedence over the provider's API key env var.
    pub api_key: Option<String>,
    /// Used when the provider's base URL env var is unset.
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Trimmed key, `None` when blank.
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Trimmed base URL, `None` when blank.
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Per-provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
}

/// Everything read from `config.toml`. Missing keys take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model alias or `provider:model`
    pub model: String,

    /// Maximum tokens per response
    pub max_tokens: u32,

    /// System prompt sent with every conversation
    pub system_prompt: String,

    /// Ask reasoning-capable models to think first
    pub reasoning: bool,

    /// Reasoning effort, 1 (minimal) to 4 (high)
    pub reasoning_effort: u8,

    /// Render reasoning text in the transcript
    pub show_reasoning: bool,

    /// Built-in theme name or path to a theme file
    pub style: String,

    pub providers: ProvidersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            system_prompt: Self::DEFAULT_SYSTEM_PROMPT.to_string(),
            reasoning: true,
            reasoning_effort: ReasoningEffort::MAX,
            show_reasoning: false,
            style: Self::DEFAULT_STYLE.to_string(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    pub const DEFAULT_MODEL: &str = "sonnet";
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;
    pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a concise assistant to a software engineer";
    pub const DEFAULT_STYLE: &str = "dark";

    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Returns the configured reasoning effort, clamped to the valid range.
    pub fn effort(&self) -> ReasoningEffort {
        ReasoningEffort::new(self.reasoning_effort)
    }

    /// Writes the commented template to `path`. Refuses to overwrite.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })
    }
}
