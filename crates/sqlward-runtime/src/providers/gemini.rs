//! Google Gemini generateContent provider.
//!
//! Gemini takes a single user message, so the instruction and the turn are
//! combined with [`PromptTemplate::single_turn`](crate::prompts::PromptTemplate::single_turn).
//! The key travels in the `x-goog-api-key` header, never in the URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    secrets::ApiCredential,
    LlmProvider, ProviderError, ProviderOutcome,
};
use crate::config::GeminiSettings;

/// Environment variable name for the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const DISPLAY_NAME: &str = "Gemini";

/// Google Gemini provider.
pub struct GeminiProvider {
    credential: Option<ApiCredential>,
    base_url: String,
    model: String,
    generation: GenerationConfig,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

impl From<&GeminiSettings> for GenerationConfig {
    fn from(settings: &GeminiSettings) -> Self {
        Self {
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
            top_p: settings.top_p,
            top_k: settings.top_k,
        }
    }
}

impl GeminiProvider {
    /// Provider with an explicit key and default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = GeminiSettings::default();
        Self {
            credential: ApiCredential::provided(api_key, "Gemini API key"),
            generation: GenerationConfig::from(&defaults),
            base_url: defaults.base_url,
            model: defaults.model,
            timeout: crate::config::DEFAULT_TIMEOUT,
        }
    }

    /// Provider from settings, key resolved config-first then `GEMINI_API_KEY`.
    pub fn from_settings(settings: &GeminiSettings, timeout: Duration) -> Self {
        Self {
            credential: ApiCredential::resolve(
                settings.api_key.as_deref(),
                GEMINI_API_KEY_ENV,
                "Gemini API key",
            ),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            generation: GenerationConfig::from(settings),
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

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn credential(&self) -> Result<&ApiCredential, ProviderError> {
        self.credential
            .as_ref()
            .filter(|c| c.is_usable())
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "Gemini API key not configured: set gemini.api_key or {}",
                    GEMINI_API_KEY_ENV
                ))
            })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    #[cfg(feature = "gemini")]
    async fn generate(&self, instruction: &str, turn: &str) -> ProviderOutcome {
        use super::http;
        use crate::prompts::PromptTemplate;

        let credential = self.credential()?;

        let text = PromptTemplate::single_turn(instruction, turn);
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: &text }],
            }],
            generation_config: &self.generation,
        };

        tracing::debug!(provider = DISPLAY_NAME, model = %self.model, "Sending generateContent request");

        let response = http::client()
            .post(self.endpoint())
            .header("x-goog-api-key", credential.expose())
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
                message: body,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).unwrap_or_default();
        http::non_blank(parsed.text(), "No response generated by Gemini")
    }

    #[cfg(not(feature = "gemini"))]
    async fn generate(&self, _instruction: &str, _turn: &str) -> ProviderOutcome {
        self.credential()?;
        Err(ProviderError::NotConfigured(
            "Gemini provider requires the 'gemini' feature".to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderErrorKind;

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new("key");
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
        assert!(!provider.endpoint().contains("key="));
    }

    #[test]
    fn test_request_shape() {
        let generation = GenerationConfig::from(&GeminiSettings::default());
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: "PROMPT" }],
            }],
            generation_config: &generation,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "PROMPT");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 500);
        assert_eq!(json["generationConfig"]["topK"], 10);
        assert!(json["generationConfig"]["topP"].as_f64().unwrap() > 0.79);
    }

    #[test]
    fn test_response_text_extraction() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"SELECT 1;"}],"role":"model"}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.text(), Some("SELECT 1;"));

        for body in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{"finishReason":"SAFETY"}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
        ] {
            let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
            assert_eq!(parsed.text(), None, "body: {}", body);
        }
    }

    #[tokio::test]
    async fn test_missing_credential_is_not_configured() {
        let provider = GeminiProvider::new("unused").without_credential();
        assert!(!provider.health_check().await);

        let err = provider.generate("instruction", "turn").await.unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::NotConfigured);
        assert!(err.detail().contains(GEMINI_API_KEY_ENV));
    }
}
