//! Core types shared by the sanitizer, the validator and the runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named safety profile a candidate statement is validated against.
///
/// Selected by the caller per invocation. Never global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Only a single retrieval statement is acceptable.
    StrictReadOnly,

    /// Retrieval and row-level mutation are acceptable; schema and
    /// privilege statements are not.
    RestrictedMutation,
}

impl ValidationPolicy {
    /// Every policy, in table order.
    pub const ALL: [ValidationPolicy; 2] = [
        ValidationPolicy::StrictReadOnly,
        ValidationPolicy::RestrictedMutation,
    ];

    /// Stable identifier used in policy files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationPolicy::StrictReadOnly => "strict_read_only",
            ValidationPolicy::RestrictedMutation => "restricted_mutation",
        }
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy::StrictReadOnly
    }
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a policy name cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown validation policy '{0}' (expected 'strict' or 'restricted')")]
pub struct UnknownPolicy(pub String);

impl FromStr for ValidationPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "strict" | "strict_read_only" | "read_only" => Ok(ValidationPolicy::StrictReadOnly),
            "restricted" | "restricted_mutation" | "manual" => {
                Ok(ValidationPolicy::RestrictedMutation)
            }
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// The validator guard that produced a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    Empty,
    Sentinel,
    LeadingVerb,
    SingleStatement,
    NoComments,
    Denylist,
}

impl Guard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Guard::Empty => "empty",
            Guard::Sentinel => "sentinel",
            Guard::LeadingVerb => "leading_verb",
            Guard::SingleStatement => "single_statement",
            Guard::NoComments => "no_comments",
            Guard::Denylist => "denylist",
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a candidate statement was refused.
///
/// The `Display` output is the human-readable reason surfaced to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("empty")]
    Empty,

    /// The model declined with the sentinel token; the text is passed through.
    #[error("{0}")]
    Sentinel(String),

    #[error("operation not permitted")]
    OperationNotPermitted { verb: String },

    #[error("multiple statements not allowed")]
    MultipleStatements { terminators: usize },

    #[error("comments not allowed")]
    CommentsNotAllowed { marker: &'static str },

    #[error("forbidden operation: {keyword}")]
    ForbiddenKeyword { keyword: String },
}

impl Rejection {
    /// The guard responsible for this rejection.
    pub fn guard(&self) -> Guard {
        match self {
            Rejection::Empty => Guard::Empty,
            Rejection::Sentinel(_) => Guard::Sentinel,
            Rejection::OperationNotPermitted { .. } => Guard::LeadingVerb,
            Rejection::MultipleStatements { .. } => Guard::SingleStatement,
            Rejection::CommentsNotAllowed { .. } => Guard::NoComments,
            Rejection::ForbiddenKeyword { .. } => Guard::Denylist,
        }
    }

    /// Human-readable reason.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// Whether the model itself declined via the sentinel token.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Rejection::Sentinel(_))
    }
}

/// Result of running a candidate through the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(String),
    Invalid(Rejection),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    /// The accepted statement, if any.
    pub fn statement(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid(statement) => Some(statement),
            ValidationResult::Invalid(_) => None,
        }
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid(rejection) => Some(rejection),
        }
    }

    pub fn into_result(self) -> Result<String, Rejection> {
        match self {
            ValidationResult::Valid(statement) => Ok(statement),
            ValidationResult::Invalid(rejection) => Err(rejection),
        }
    }
}

impl From<Result<String, Rejection>> for ValidationResult {
    fn from(result: Result<String, Rejection>) -> Self {
        match result {
            Ok(statement) => ValidationResult::Valid(statement),
            Err(rejection) => ValidationResult::Invalid(rejection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "strict".parse::<ValidationPolicy>().unwrap(),
            ValidationPolicy::StrictReadOnly
        );
        assert_eq!(
            "Restricted-Mutation".parse::<ValidationPolicy>().unwrap(),
            ValidationPolicy::RestrictedMutation
        );
        assert_eq!(
            "manual".parse::<ValidationPolicy>().unwrap(),
            ValidationPolicy::RestrictedMutation
        );
        assert!("admin".parse::<ValidationPolicy>().is_err());
    }

    #[test]
    fn test_policy_serde_names() {
        let json = serde_json::to_string(&ValidationPolicy::RestrictedMutation).unwrap();
        assert_eq!(json, "\"restricted_mutation\"");
        assert_eq!(ValidationPolicy::StrictReadOnly.to_string(), "strict_read_only");
    }

    #[test]
    fn test_rejection_reasons() {
        assert_eq!(Rejection::Empty.reason(), "empty");
        assert_eq!(
            Rejection::ForbiddenKeyword {
                keyword: "DROP".to_string()
            }
            .reason(),
            "forbidden operation: DROP"
        );
        assert_eq!(
            Rejection::MultipleStatements { terminators: 2 }.reason(),
            "multiple statements not allowed"
        );
        assert_eq!(
            Rejection::CommentsNotAllowed { marker: "--" }.reason(),
            "comments not allowed"
        );
        assert_eq!(
            Rejection::OperationNotPermitted {
                verb: "SHOW".to_string()
            }
            .reason(),
            "operation not permitted"
        );
    }

    #[test]
    fn test_rejection_guard_mapping() {
        assert_eq!(Rejection::Empty.guard(), Guard::Empty);
        assert_eq!(
            Rejection::Sentinel("ERROR: nope".to_string()).guard(),
            Guard::Sentinel
        );
        assert!(Rejection::Sentinel("ERROR: nope".to_string()).is_sentinel());
        assert!(!Rejection::Empty.is_sentinel());
    }

    #[test]
    fn test_validation_result_accessors() {
        let valid = ValidationResult::Valid("SELECT 1;".to_string());
        assert!(valid.is_valid());
        assert_eq!(valid.statement(), Some("SELECT 1;"));
        assert!(valid.rejection().is_none());

        let invalid = ValidationResult::Invalid(Rejection::Empty);
        assert!(!invalid.is_valid());
        assert_eq!(invalid.clone().into_result(), Err(Rejection::Empty));
    }
}
