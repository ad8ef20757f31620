//! Chat backends.
//!
//! Every backend implements [`ChatProvider`]; which one is used is decided
//! once from the configured model name by [`resolve_model`].

pub mod anthropic;
pub mod echo;
pub mod openai;
pub mod shared;

use std::fmt;

use anyhow::{Result, bail};
use futures_util::future::BoxFuture;

pub use shared::{
    ChatMessage, ChunkStream, Conversation, ProviderError, ProviderErrorKind, ProviderResult,
    Role,
};

use crate::config::{Config, ReasoningEffort};

/// Capability interface shared by all backends.
pub trait ChatProvider: Send {
    /// Starts an exchange for `prompt`.
    ///
    /// The prompt becomes the pending user turn; the returned future resolves
    /// once the request is accepted and yields the chunk stream.
    fn stream_completion(
        &mut self,
        prompt: &str,
    ) -> BoxFuture<'static, ProviderResult<ChunkStream>>;

    /// Commits the pending turn with the final response text.
    fn finish_exchange(&mut self, response: &str);

    /// Forgets all previous turns.
    fn clear_history(&mut self);

    fn history(&self) -> &[ChatMessage];

    fn model_id(&self) -> &str;

    fn supports_reasoning(&self) -> bool;
}

/// Backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Echo,
}

impl ProviderKind {
    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Echo => "echo",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "openai" => Some(ProviderKind::OpenAI),
            "anthropic" | "claude" => Some(ProviderKind::Anthropic),
            "echo" => Some(ProviderKind::Echo),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A resolved model: backend, wire id and capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub id: String,
    pub supports_reasoning: bool,
}

struct ModelAlias {
    name: &'static str,
    provider: ProviderKind,
    id: &'static str,
    reasoning: bool,
}

const fn alias(
    name: &'static str,
    provider: ProviderKind,
    id: &'static str,
    reasoning: bool,
) -> ModelAlias {
    ModelAlias {
        name,
        provider,
        id,
        reasoning,
    }
}

const MODEL_ALIASES: &[ModelAlias] = &[
    alias("sonnet", ProviderKind::Anthropic, "claude-sonnet-4-5", true),
    alias("opus", ProviderKind::Anthropic, "claude-opus-4-1", true),
    alias("haiku", ProviderKind::Anthropic, "claude-3-5-haiku-latest", false),
    alias("gpt-5", ProviderKind::OpenAI, "gpt-5", true),
    alias("gpt-5-mini", ProviderKind::OpenAI, "gpt-5-mini", true),
    alias("gpt-4.1", ProviderKind::OpenAI, "gpt-4.1", false),
    alias("gpt-4o-mini", ProviderKind::OpenAI, "gpt-4o-mini", false),
    alias("o3", ProviderKind::OpenAI, "o3", true),
    alias("o4-mini", ProviderKind::OpenAI, "o4-mini", true),
    alias("echo", ProviderKind::Echo, "echo", true),
];

/// Names accepted without a provider prefix.
pub fn model_aliases() -> impl Iterator<Item = &'static str> {
    MODEL_ALIASES.iter().map(|alias| alias.name)
}

/// Guesses reasoning support for ids not in the alias table.
fn id_supports_reasoning(provider: ProviderKind, id: &str) -> bool {
    match provider {
        ProviderKind::Anthropic => id.contains("sonnet") || id.contains("opus"),
        ProviderKind::OpenAI => {
            id.starts_with("gpt-5")
                || id
                    .strip_prefix('o')
                    .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        }
        ProviderKind::Echo => true,
    }
}

/// Resolves `model` as an alias or as `provider:model`.
///
/// # Errors
/// Fails for unknown aliases and unknown provider prefixes.
pub fn resolve_model(model: &str) -> Result<ModelSpec> {
    let model = model.trim();

    if let Some(alias) = MODEL_ALIASES.iter().find(|a| a.name == model) {
        return Ok(ModelSpec {
            provider: alias.provider,
            id: alias.id.to_string(),
            supports_reasoning: alias.reasoning,
        });
    }

    if let Some((prefix, id)) = model.split_once(':') {
        let Some(provider) = ProviderKind::from_prefix(prefix) else {
            bail!("Unknown provider '{prefix}' in model '{model}'. Use openai, anthropic or echo.");
        };
        if id.is_empty() {
            bail!("Missing model id after '{prefix}:'");
        }
        return Ok(ModelSpec {
            provider,
            id: id.to_string(),
            supports_reasoning: id_supports_reasoning(provider, id),
        });
    }

    let known = model_aliases().collect::<Vec<_>>().join(", ");
    bail!("Unknown model '{model}'. Use one of: {known}, or provider:model.")
}

/// Generation settings shared by all backends.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub system_prompt: String,
    pub max_tokens: u32,
    pub reasoning: bool,
    pub effort: ReasoningEffort,
}

impl GenerationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            max_tokens: config.max_tokens,
            reasoning: config.reasoning,
            effort: config.effort(),
        }
    }
}

/// Builds the provider selected by `config.model`.
///
/// # Errors
/// Fails when the model is unknown, credentials are missing or a base URL is invalid.
pub fn build_provider(config: &Config) -> Result<Box<dyn ChatProvider>> {
    let spec = resolve_model(&config.model)?;
    let settings = GenerationSettings::from_config(config);
    tracing::info!(provider = %spec.provider, model = %spec.id, "selected model");

    let provider: Box<dyn ChatProvider> = match spec.provider {
        ProviderKind::OpenAI => Box::new(openai::OpenAiProvider::from_config(
            spec,
            settings,
            &config.providers.openai,
        )?),
        ProviderKind::Anthropic => Box::new(anthropic::AnthropicProvider::from_config(
            spec,
            settings,
            &config.providers.anthropic,
        )?),
        ProviderKind::Echo => Box::new(echo::EchoProvider::new(settings.reasoning)),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_alias() {
        let spec = resolve_model("sonnet").unwrap();
        assert_eq!(spec.provider, ProviderKind::Anthropic);
        assert_eq!(spec.id, "claude-sonnet-4-5");
        assert!(spec.supports_reasoning);

        let spec = resolve_model("gpt-4o-mini").unwrap();
        assert_eq!(spec.provider, ProviderKind::OpenAI);
        assert!(!spec.supports_reasoning);
    }

    #[test]
    fn test_resolve_prefixed_model() {
        let spec = resolve_model("openai:o1-preview").unwrap();
        assert_eq!(spec.provider, ProviderKind::OpenAI);
        assert_eq!(spec.id, "o1-preview");
        assert!(spec.supports_reasoning);

        let spec = resolve_model("anthropic:claude-3-haiku").unwrap();
        assert!(!spec.supports_reasoning);

        let spec = resolve_model("openai:llama3").unwrap();
        assert!(!spec.supports_reasoning);
    }

    #[test]
    fn test_resolve_unknown_lists_aliases() {
        let err = resolve_model("gpt-2").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Unknown model 'gpt-2'"));
        assert!(msg.contains("sonnet"));

        assert!(resolve_model("acme:thing").is_err());
        assert!(resolve_model("openai:").is_err());
    }

    #[test]
    fn test_build_echo_provider() {
        let config = Config {
            model: "echo".to_string(),
            ..Config::default()
        };
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.model_id(), "echo");
        assert!(provider.history().is_empty());
    }
}
