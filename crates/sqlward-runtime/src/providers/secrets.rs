//! Credential handling for LLM providers.
//!
//! - Credentials never appear in `Debug`/`Display` output
//! - Values are zeroed on drop (`secrecy`)
//! - Placeholder values shipped in sample `.env` files count as missing
//!
//! ## Usage
//!
//! ```ignore
//! let cred = ApiCredential::resolve(settings.api_key.as_deref(), "OPENAI_API_KEY", "OpenAI API key");
//!
//! if let Some(cred) = &cred {
//!     request.bearer_auth(cred.expose());
//! }
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Sample values that mean "not configured".
pub const PLACEHOLDER_KEYS: &[&str] = &["your_openai_api_key_here", "your_gemini_api_key_here"];

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from the settings file
    Config,
    /// Loaded from environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// Whether a raw credential value is blank or a known placeholder.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || PLACEHOLDER_KEYS.iter().any(|p| value.eq_ignore_ascii_case(p))
}

/// A securely-stored API credential.
///
/// ```ignore
/// let cred = ApiCredential::new("sk-secret-key", CredentialSource::Environment, "OpenAI API key");
///
/// // Safe to log - shows [REDACTED]
/// tracing::debug!(credential = %cred, "Provider ready");
/// ```
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Credential handed over in code. Blank and placeholder values give `None`.
    pub fn provided(value: impl Into<String>, name: &'static str) -> Option<Self> {
        let value = value.into();
        if is_placeholder(&value) {
            tracing::debug!(credential = name, "Ignoring placeholder credential");
            return None;
        }
        Some(Self::new(value.trim(), CredentialSource::Programmatic, name))
    }

    /// Whether the value is usable for a request.
    pub fn is_usable(&self) -> bool {
        !is_placeholder(self.expose())
    }

    /// Resolve a credential config-first, environment-second.
    ///
    /// Returns `None` when neither holds a usable value.
    pub fn resolve(
        config_value: Option<&str>,
        env_var: &str,
        name: &'static str,
    ) -> Option<Self> {
        Self::resolve_with(config_value, env_var, name, |key| std::env::var(key).ok())
    }

    /// [`resolve`](Self::resolve) with an explicit environment lookup.
    pub fn resolve_with<F>(
        config_value: Option<&str>,
        env_var: &str,
        name: &'static str,
        lookup: F,
    ) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = config_value {
            if !is_placeholder(value) {
                return Some(Self::new(value.trim(), CredentialSource::Config, name));
            }
            tracing::debug!(credential = name, "Ignoring placeholder credential in config");
        }

        match lookup(env_var) {
            Some(value) if !is_placeholder(&value) => {
                Some(Self::new(value.trim(), CredentialSource::Environment, name))
            }
            Some(_) => {
                tracing::debug!(
                    credential = name,
                    env_var,
                    "Ignoring placeholder credential in environment"
                );
                None
            }
            None => None,
        }
    }

    /// Expose the value. Call only where the request header is set.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
