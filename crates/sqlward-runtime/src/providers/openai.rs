//! OpenAI chat-completions provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    secrets::ApiCredential,
    LlmProvider, ProviderError, ProviderOutcome,
};
use crate::config::OpenAiSettings;

/// Environment variable name for the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const DISPLAY_NAME: &str = "OpenAI";

/// OpenAI chat-completions provider.
pub struct OpenAiProvider {
    credential: Option<ApiCredential>,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiProvider {
    /// Provider with an explicit key and default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = OpenAiSettings::default();
        Self {
            credential: ApiCredential::provided(api_key, "OpenAI API key"),
            base_url: defaults.base_url,
            model: defaults.model,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            timeout: crate::config::DEFAULT_TIMEOUT,
        }
    }

    /// Provider from settings, key resolved config-first then `OPENAI_API_KEY`.
    pub fn from_settings(settings: &OpenAiSettings, timeout: Duration) -> Self {
        Self {
            credential: ApiCredential::resolve(
                settings.api_key.as_deref(),
                OPENAI_API_KEY_ENV,
                "OpenAI API key",
            ),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout,
        }
    }

    /// Drop any configured key.
    pub fn without_credential(mut self) -> Self {
        self.credential = None;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn credential(&self) -> Result<&ApiCredential, ProviderError> {
        self.credential
            .as_ref()
            .filter(|c| c.is_usable())
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "OpenAI API key not configured: set openai.api_key or {}",
                    OPENAI_API_KEY_ENV
                ))
            })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl ChatResponse {
    fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }
}

/// Error message from a non-success body, `Unknown error` when absent.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| "Unknown error".to_string())
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    #[cfg(feature = "openai")]
    async fn generate(&self, instruction: &str, turn: &str) -> ProviderOutcome {
        use super::http;

        let credential = self.credential()?;

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: instruction,
                },
                ChatMessage {
                    role: "user",
                    content: turn,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(provider = DISPLAY_NAME, model = %self.model, "Sending chat completion request");

        let response = http::client()
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(credential.expose())
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::map_request_error(DISPLAY_NAME, self.timeout, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| http::map_request_error(DISPLAY_NAME, self.timeout, e))?;

        if !status.is_success() {
            return Err(ProviderError::ProviderRejected {
                provider: DISPLAY_NAME.to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).unwrap_or_default();
        http::non_blank(parsed.text(), "No response generated by OpenAI")
    }

    #[cfg(not(feature = "openai"))]
    async fn generate(&self, _instruction: &str, _turn: &str) -> ProviderOutcome {
        self.credential()?;
        Err(ProviderError::NotConfigured(
            "OpenAI provider requires the 'openai' feature".to_string(),
        ))
    }

    async fn health_check(&self) -> bool {
        self.credential().is_ok()
    }

    fn name(&self) -> &str {
        DISPLAY_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
