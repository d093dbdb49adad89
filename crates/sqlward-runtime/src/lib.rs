//! # sqlward-runtime
//!
//! LLM-backed SQL generation around the deterministic core.
//!
//! `sqlward-core` decides whether a statement is safe; this crate gets one
//! from a language model. A [`Pipeline`] renders the prompt, makes exactly
//! one provider call bounded by the configured timeout, then sanitizes and
//! validates whatever came back.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlward_runtime::{GenerationRequest, Pipeline, Settings};
//! use sqlward_core::ValidationPolicy;
//!
//! let settings = Settings::load(None)?;
//! let pipeline = Pipeline::from_settings(&settings)?;
//!
//! let request = GenerationRequest::new("Find employees older than 30", schema);
//! let outcome = pipeline
//!     .generate_and_validate(&request, ValidationPolicy::StrictReadOnly)
//!     .await;
//!
//! if let Some(sql) = outcome.statement() {
//!     execute(sql);
//! }
//! ```

pub mod config;
pub mod orchestrator;
pub mod prompts;
pub mod providers;

pub use config::{ConfigError, GeminiSettings, OpenAiSettings, Settings};
pub use orchestrator::{GenerationRequest, Outcome, Pipeline, PipelineBuilder};
pub use prompts::PromptTemplate;
pub use providers::{
    ApiCredential, CredentialSource, GeminiProvider, LlmProvider, OpenAiProvider, ProviderError,
    ProviderErrorKind, ProviderKind, ProviderOutcome,
};
