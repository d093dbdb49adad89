//! Generation-and-safety pipeline.
//!
//! Sequences prompt rendering, one provider call, sanitization and
//! validation, and folds every failure into a single [`Outcome`].
//! Holds no mutable state: one `Pipeline` serves concurrent callers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use sqlward_core::{
    OutcomeCategory, OutcomeReport, PolicyTable, Rejection, ValidationPolicy, ValidationResult,
};

use crate::config::{ConfigError, Settings, DEFAULT_TIMEOUT};
use crate::prompts::PromptTemplate;
use crate::providers::{LlmProvider, ProviderError, ProviderOutcome};

/// Reason given when the request text is blank.
pub const BLANK_REQUEST_REASON: &str = "Empty prompt provided";

/// One natural-language request plus the schema it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub user_text: String,

    /// Opaque description, embedded verbatim in the instruction
    pub schema_description: String,
}

impl GenerationRequest {
    pub fn new(user_text: impl Into<String>, schema_description: impl Into<String>) -> Self {
        Self {
            user_text: user_text.into(),
            schema_description: schema_description.into(),
        }
    }
}

/// Final result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The statement passed every guard of `policy`.
    Accepted {
        statement: String,
        policy: ValidationPolicy,
    },

    /// Rejected before any provider call.
    InvalidRequest { reason: String },

    /// The provider call failed; sanitizer and validator did not run.
    ProviderFailed(ProviderError),

    /// The model answered but the candidate was refused.
    RejectedBySafety {
        statement: String,
        rejection: Rejection,
    },
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }

    /// The accepted statement. Only accepted statements may be executed.
    pub fn statement(&self) -> Option<&str> {
        match self {
            Outcome::Accepted { statement, .. } => Some(statement),
            _ => None,
        }
    }

    /// Human-readable reason for a negative outcome.
    pub fn reason(&self) -> Option<String> {
        match self {
            Outcome::Accepted { .. } => None,
            Outcome::InvalidRequest { reason } => Some(reason.clone()),
            Outcome::ProviderFailed(error) => Some(error.detail()),
            Outcome::RejectedBySafety { rejection, .. } => Some(rejection.reason()),
        }
    }

    pub fn category(&self) -> OutcomeCategory {
        match self {
            Outcome::Accepted { .. } => OutcomeCategory::Accepted,
            Outcome::InvalidRequest { .. } => OutcomeCategory::InvalidRequest,
            Outcome::ProviderFailed(error) => error.kind().category(),
            Outcome::RejectedBySafety { rejection, .. } if rejection.is_sentinel() => {
                OutcomeCategory::Sentinel
            }
            Outcome::RejectedBySafety { .. } => OutcomeCategory::Safety,
        }
    }

    /// `{ accepted, statement, reason, category }` for callers.
    ///
    /// A refused candidate is included as `statement` for diagnostics.
    pub fn report(&self) -> OutcomeReport {
        match self {
            Outcome::Accepted { statement, .. } => OutcomeReport::accepted(statement.clone()),
            Outcome::RejectedBySafety {
                statement,
                rejection,
            } => OutcomeReport::rejected(
                self.category(),
                (!statement.is_empty()).then(|| statement.clone()),
                rejection.reason(),
            ),
            _ => OutcomeReport::rejected(
                self.category(),
                None,
                self.reason().unwrap_or_default(),
            ),
        }
    }
}

/// The generation-and-safety pipeline.
pub struct Pipeline {
    provider: Arc<dyn LlmProvider>,
    template: PromptTemplate,
    policies: PolicyTable,
    timeout: Duration,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("provider", &self.provider.name())
            .field("template", &self.template)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Build the pipeline described by validated settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            provider: settings.provider.build(settings),
            template: PromptTemplate::new(settings.dialect.clone()),
            policies: settings.policy_table()?,
            timeout: settings.timeout,
        })
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    /// Generate a statement for `request` and validate it under `policy`.
    pub async fn generate_and_validate(
        &self,
        request: &GenerationRequest,
        policy: ValidationPolicy,
    ) -> Outcome {
        if request.user_text.trim().is_empty() {
            tracing::warn!(policy = %policy, "Blank request rejected");
            return Outcome::InvalidRequest {
                reason: BLANK_REQUEST_REASON.to_string(),
            };
        }

        let instruction = self.template.render(&request.schema_description);
        let turn = self.template.render_user_turn(&request.user_text);

        let raw = match self.call_provider(&instruction, &turn).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    kind = %error.kind(),
                    error = %error,
                    "Provider call failed"
                );
                return Outcome::ProviderFailed(error);
            }
        };

        let (candidate, result) = self.policies.check(&raw, policy);
        match result {
            ValidationResult::Valid(statement) => {
                tracing::info!(policy = %policy, statement = %statement, "Statement accepted");
                Outcome::Accepted { statement, policy }
            }
            ValidationResult::Invalid(rejection) => {
                tracing::warn!(
                    policy = %policy,
                    guard = %rejection.guard(),
                    reason = %rejection,
                    "Statement rejected"
                );
                Outcome::RejectedBySafety {
                    statement: candidate,
                    rejection,
                }
            }
        }
    }

    /// One provider call bounded by the pipeline timeout.
    async fn call_provider(&self, instruction: &str, turn: &str) -> ProviderOutcome {
        match tokio::time::timeout(self.timeout, self.provider.generate(instruction, turn)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderError::Timeout {
                provider: self.provider.name().to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    template: PromptTemplate,
    policies: Option<PolicyTable>,
    timeout: Duration,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            template: PromptTemplate::default(),
            policies: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn policies(mut self, policies: PolicyTable) -> Self {
        self.policies = Some(policies);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Pipeline, ConfigError> {
        let provider = self
            .provider
            .ok_or_else(|| ConfigError::ValidationError("no provider set".to_string()))?;

        if self.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Pipeline {
            provider,
            template: self.template,
            policies: self
                .policies
                .unwrap_or_else(|| PolicyTable::builtin().clone()),
            timeout: self.timeout,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
