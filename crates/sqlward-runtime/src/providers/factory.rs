//! Provider selection.
//!
//! The set of backends is closed: [`ProviderKind`] names each one and is the
//! single construction point for the active provider.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::{GeminiProvider, LlmProvider, OpenAiProvider};
use crate::config::{ConfigError, Settings};

/// Supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(alias = "open_ai")]
    OpenAi,
    #[default]
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Build the provider described by `settings`.
    ///
    /// A missing credential does not fail here; the provider reports
    /// `NotConfigured` on each call instead, without touching the network.
    pub fn build(&self, settings: &Settings) -> Arc<dyn LlmProvider> {
        let provider: Arc<dyn LlmProvider> = match self {
            ProviderKind::OpenAi => {
                Arc::new(OpenAiProvider::from_settings(&settings.openai, settings.timeout))
            }
            ProviderKind::Gemini => {
                Arc::new(GeminiProvider::from_settings(&settings.gemini, settings.timeout))
            }
        };

        tracing::debug!(
            provider = provider.name(),
            model = provider.model(),
            timeout = ?settings.timeout,
            "Provider constructed"
        );
        provider
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}
