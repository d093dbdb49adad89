//! Runtime settings.
//!
//! Loaded once at startup from an optional YAML file, overridden from the
//! environment, validated, then passed by reference. Nothing here is
//! mutated after [`Settings::load`] returns.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use sqlward_core::{PolicyError, PolicyTable};

use crate::prompts::DEFAULT_DIALECT;
use crate::providers::ProviderKind;

/// Environment variable selecting the active provider.
pub const PROVIDER_ENV: &str = "AI_PROVIDER";

/// Time allowed for one provider call, shared by every backend.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Unknown provider '{0}' (expected 'openai' or 'gemini')")]
    UnknownProvider(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Failed to load policy table: {0}")]
    Policy(#[from] PolicyError),
}

/// OpenAI chat-completions settings.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenAiSettings {
    /// Falls back to `OPENAI_API_KEY`
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.1,
            max_tokens: 500,
        }
    }
}

impl fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Gemini generateContent settings.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeminiSettings {
    /// Falls back to `GEMINI_API_KEY`
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-pro".to_string(),
            temperature: 0.1,
            max_output_tokens: 500,
            top_p: 0.8,
            top_k: 10,
        }
    }
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .finish()
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Active backend
    pub provider: ProviderKind,

    /// Per-call time limit, e.g. `"30s"` or `"1m 30s"`
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,

    /// SQL dialect named in prompts
    pub dialect: String,

    pub openai: OpenAiSettings,

    pub gemini: GeminiSettings,

    /// Custom policy table (YAML or JSON); built-in table when unset
    pub policies: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            timeout: DEFAULT_TIMEOUT,
            dialect: DEFAULT_DIALECT.to_string(),
            openai: OpenAiSettings::default(),
            gemini: GeminiSettings::default(),
            policies: None,
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => humantime::parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

impl Settings {
    /// Load settings from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::default(),
        };
        settings.apply_env_overrides_with(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse settings from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            path: PathBuf::new(),
            reason: e.to_string(),
        })
    }

    /// Apply `AI_PROVIDER` from the given environment lookup.
    ///
    /// API keys are not copied here; they resolve config-first,
    /// environment-second when the provider is built.
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup(PROVIDER_ENV) {
            if !provider.trim().is_empty() {
                self.provider = provider.parse()?;
            }
        }
        Ok(())
    }

    /// Check settings that would otherwise fail at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "timeout must be greater than zero".to_string(),
            ));
        }

        if self.dialect.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "dialect must not be empty".to_string(),
            ));
        }

        for (name, url) in [
            ("openai.base_url", &self.openai.base_url),
            ("gemini.base_url", &self.gemini.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }

        Ok(())
    }

    /// The policy table named by `policies`, or the built-in one.
    pub fn policy_table(&self) -> Result<PolicyTable, ConfigError> {
        match &self.policies {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading policy table");
                Ok(PolicyTable::from_path(path)?)
            }
            None => Ok(PolicyTable::builtin().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.provider, ProviderKind::Gemini);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.dialect, "MySQL");
        assert_eq!(settings.openai.model, "gpt-4");
        assert_eq!(settings.openai.max_tokens, 500);
        assert_eq!(settings.gemini.model, "gemini-pro");
        assert_eq!(settings.gemini.top_k, 10);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
provider: openai
timeout: 10s
dialect: PostgreSQL
openai:
  model: gpt-4o-mini
  base_url: http://localhost:8080/v1
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.provider, ProviderKind::OpenAi);
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.dialect, "PostgreSQL");
        assert_eq!(settings.openai.model, "gpt-4o-mini");
        assert_eq!(settings.openai.temperature, 0.1);
        assert_eq!(settings.gemini.model, "gemini-pro");
    }

    #[test]
    fn test_timeout_as_seconds() {
        let settings = Settings::from_yaml("timeout: 45").unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_empty_file_is_default() {
        let settings = Settings::from_yaml("").unwrap();
        assert_eq!(settings.provider, ProviderKind::Gemini);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            Settings::from_yaml("providr: openai"),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_unknown_provider_in_file_rejected() {
        assert!(Settings::from_yaml("provider: anthropic").is_err());
    }

    #[test]
    fn test_env_override_selects_provider() {
        let mut settings = Settings::default();
        settings
            .apply_env_overrides_with(|key| (key == PROVIDER_ENV).then(|| "OpenAI".to_string()))
            .unwrap();
        assert_eq!(settings.provider, ProviderKind::OpenAi);
    }

    #[test]
    fn test_env_override_unknown_provider() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env_overrides_with(|_| Some("claude".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider(name) if name == "claude"));
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        settings.timeout = Duration::ZERO;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.gemini.base_url = "generativelanguage.googleapis.com".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let mut settings = Settings::default();
        settings.openai.api_key = Some("sk-super-secret".to_string());
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("sk-super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_builtin_policy_table_by_default() {
        let table = Settings::default().policy_table().unwrap();
        assert_eq!(table.policies().count(), 2);
    }
}
