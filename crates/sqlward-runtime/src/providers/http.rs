//! Shared HTTP plumbing for the reqwest-backed providers.

use std::sync::OnceLock;
use std::time::Duration;

use super::ProviderError;

/// Process-wide client. Timeouts are set per request.
pub(crate) fn client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

/// Map a reqwest failure onto the provider error taxonomy.
pub(crate) fn map_request_error(
    provider: &str,
    timeout: Duration,
    error: reqwest::Error,
) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout {
            provider: provider.to_string(),
            timeout,
        }
    } else {
        ProviderError::Transport {
            provider: provider.to_string(),
            message: error.to_string(),
        }
    }
}

/// Trim returned text; blank text counts as no response.
pub(crate) fn non_blank(text: Option<&str>, empty_detail: &str) -> Result<String, ProviderError> {
    match text.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ProviderError::EmptyResponse(empty_detail.to_string())),
    }
}
