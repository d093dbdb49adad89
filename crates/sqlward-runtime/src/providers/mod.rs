//! LLM provider abstractions for sqlward-runtime.
//!
//! Exactly two backends exist (OpenAI chat completions and Gemini
//! generateContent), selected once at construction through [`ProviderKind`].
//! Adapters never inspect or mutate the text they return.
//!
//! ## Security
//!
//! All providers hold their key as an [`ApiCredential`]; it is exposed only
//! when the request header is set.

use async_trait::async_trait;
use serde::Serialize;
use sqlward_core::OutcomeCategory;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

mod factory;
mod gemini;
mod openai;
pub mod secrets;

#[cfg(any(feature = "openai", feature = "gemini"))]
mod http;

pub use factory::ProviderKind;
pub use gemini::{GeminiProvider, GEMINI_API_KEY_ENV};
pub use openai::{OpenAiProvider, OPENAI_API_KEY_ENV};
pub use secrets::{ApiCredential, CredentialSource};

/// Result of one provider call.
pub type ProviderOutcome = Result<String, ProviderError>;

/// Closed set of provider failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    NotConfigured,
    Timeout,
    ProviderRejected,
    Transport,
    EmptyResponse,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::NotConfigured => "not_configured",
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::ProviderRejected => "provider_rejected",
            ProviderErrorKind::Transport => "transport",
            ProviderErrorKind::EmptyResponse => "empty_response",
        }
    }

    /// Outcome category this kind is reported under.
    pub fn category(&self) -> OutcomeCategory {
        match self {
            ProviderErrorKind::NotConfigured => OutcomeCategory::Configuration,
            ProviderErrorKind::Timeout
            | ProviderErrorKind::ProviderRejected
            | ProviderErrorKind::Transport => OutcomeCategory::Transport,
            ProviderErrorKind::EmptyResponse => OutcomeCategory::EmptyGeneration,
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from LLM providers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("{provider} API request timed out after {}", format_timeout(.timeout))]
    Timeout {
        provider: String,
        timeout: Duration,
    },

    #[error("{provider} API error: {message}")]
    ProviderRejected {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} API request failed: {message}")]
    Transport {
        provider: String,
        message: String,
    },

    #[error("{0}")]
    EmptyResponse(String),
}

fn format_timeout(timeout: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*timeout)
}

impl ProviderError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::NotConfigured(_) => ProviderErrorKind::NotConfigured,
            ProviderError::Timeout { .. } => ProviderErrorKind::Timeout,
            ProviderError::ProviderRejected { .. } => ProviderErrorKind::ProviderRejected,
            ProviderError::Transport { .. } => ProviderErrorKind::Transport,
            ProviderError::EmptyResponse(_) => ProviderErrorKind::EmptyResponse,
        }
    }

    /// Human-readable detail.
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

/// A language-model backend that turns an instruction and a user turn into
/// raw text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Make exactly one outbound call. Never retried here.
    async fn generate(&self, instruction: &str, turn: &str) -> ProviderOutcome;

    /// Whether a usable credential is configured. Makes no network call.
    async fn health_check(&self) -> bool;

    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Model identifier sent to the backend.
    fn model(&self) -> &str;

    /// Endpoint base URL.
    fn base_url(&self) -> &str;
}
