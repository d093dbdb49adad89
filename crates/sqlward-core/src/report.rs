//! Caller-facing summary of a pipeline outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an outcome. Every negative outcome maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Accepted,
    InvalidRequest,
    Configuration,
    Transport,
    EmptyGeneration,
    Safety,
    Sentinel,
}

impl OutcomeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCategory::Accepted => "accepted",
            OutcomeCategory::InvalidRequest => "invalid_request",
            OutcomeCategory::Configuration => "configuration",
            OutcomeCategory::Transport => "transport",
            OutcomeCategory::EmptyGeneration => "empty_generation",
            OutcomeCategory::Safety => "safety",
            OutcomeCategory::Sentinel => "sentinel",
        }
    }
}

impl fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{ accepted, statement, reason }` as surfaced to callers, plus the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeReport {
    pub accepted: bool,

    /// The accepted statement, or the rejected candidate when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    pub category: OutcomeCategory,
}

impl OutcomeReport {
    pub fn accepted(statement: impl Into<String>) -> Self {
        Self {
            accepted: true,
            statement: Some(statement.into()),
            reason: None,
            category: OutcomeCategory::Accepted,
        }
    }

    pub fn rejected(
        category: OutcomeCategory,
        statement: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            accepted: false,
            statement,
            reason: Some(reason.into()),
            category,
        }
    }
}
