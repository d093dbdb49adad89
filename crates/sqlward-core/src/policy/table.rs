//! Policy tables: leading-verb allow-lists and keyword denylists as data.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::patterns::{self, KEYWORD_PATTERN};
use crate::sanitizer::Sanitizer;
use crate::types::{ValidationPolicy, ValidationResult};
use crate::validator;

use super::schema::validate_policy_schema;

/// Errors that can occur when loading policy tables.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Failed to read policy file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Policy file does not match schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Policy validation failed: {0}")]
    ValidationError(String),

    #[error("Missing policy: {0}")]
    MissingPolicy(ValidationPolicy),

    #[error("Invalid keyword pattern: {0}")]
    PatternError(#[from] regex::Error),
}

/// Serialized form of one policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyDefinition {
    /// What the policy is for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Verbs a statement may start with
    pub leading_verbs: Vec<String>,

    /// Keywords refused anywhere in the statement, in scan order
    #[serde(default)]
    pub denylist: Vec<String>,
}

/// Serialized form of a whole policy table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyFile {
    pub policies: BTreeMap<ValidationPolicy, PolicyDefinition>,
}

/// Compiled rules for one policy.
#[derive(Debug, Clone)]
pub struct PolicyRules {
    policy: ValidationPolicy,
    description: Option<String>,
    leading_verbs: Vec<String>,
    denylist: Vec<(String, Regex)>,
    sanitizer: Sanitizer,
}

impl PolicyRules {
    fn compile(policy: ValidationPolicy, definition: &PolicyDefinition) -> Result<Self, PolicyError> {
        let leading_verbs: Vec<String> = definition
            .leading_verbs
            .iter()
            .map(|v| v.trim().to_ascii_uppercase())
            .collect();

        let denylist = definition
            .denylist
            .iter()
            .map(|k| {
                let keyword = k.trim().to_ascii_uppercase();
                patterns::keyword_pattern(&keyword).map(|re| (keyword, re))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sanitizer = Sanitizer::with_leading_keywords(&leading_verbs)?;

        Ok(Self {
            policy,
            description: definition.description.clone(),
            leading_verbs,
            denylist,
            sanitizer,
        })
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Allowed leading verbs, uppercase.
    pub fn leading_verbs(&self) -> &[String] {
        &self.leading_verbs
    }

    /// Denylisted keywords in scan order, uppercase.
    pub fn denylist(&self) -> impl Iterator<Item = &str> {
        self.denylist.iter().map(|(k, _)| k.as_str())
    }

    /// Case-insensitive check of a statement's first token.
    pub fn allows_leading_verb(&self, token: &str) -> bool {
        !token.is_empty()
            && self
                .leading_verbs
                .iter()
                .any(|verb| verb.eq_ignore_ascii_case(token))
    }

    /// First denylisted keyword (in denylist order) present as a whole word.
    pub fn find_denied_keyword(&self, candidate: &str) -> Option<&str> {
        self.denylist
            .iter()
            .find(|(_, pattern)| pattern.is_match(candidate))
            .map(|(keyword, _)| keyword.as_str())
    }

    /// Sanitizer extracting statements that start with this policy's verbs.
    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }
}

/// Policy table keyed by [`ValidationPolicy`].
///
/// Built once at startup and shared read-only across invocations.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    strict_read_only: PolicyRules,
    restricted_mutation: PolicyRules,
}

const STRICT_READ_ONLY_VERBS: &[&str] = &["SELECT"];

const STRICT_READ_ONLY_DENYLIST: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
    "EXECUTE", "EXEC", "MERGE", "CALL", "LOAD", "REPLACE", "LOCK", "UNLOCK",
];

const RESTRICTED_MUTATION_VERBS: &[&str] = &["SELECT", "INSERT", "UPDATE", "DELETE"];

const RESTRICTED_MUTATION_DENYLIST: &[&str] =
    &["DROP", "TRUNCATE", "GRANT", "REVOKE", "ALTER", "CREATE"];

lazy_static! {
    static ref BUILTIN: PolicyTable = PolicyTable::from_file(PolicyFile::builtin())
        .expect("built-in policy table is valid");
}

impl PolicyFile {
    /// The built-in policy definitions.
    pub fn builtin() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        let mut policies = BTreeMap::new();
        policies.insert(
            ValidationPolicy::StrictReadOnly,
            PolicyDefinition {
                description: Some("Single retrieval statement only".to_string()),
                leading_verbs: owned(STRICT_READ_ONLY_VERBS),
                denylist: owned(STRICT_READ_ONLY_DENYLIST),
            },
        );
        policies.insert(
            ValidationPolicy::RestrictedMutation,
            PolicyDefinition {
                description: Some(
                    "Retrieval and row-level mutation; no schema or privilege changes".to_string(),
                ),
                leading_verbs: owned(RESTRICTED_MUTATION_VERBS),
                denylist: owned(RESTRICTED_MUTATION_DENYLIST),
            },
        );
        Self { policies }
    }

    /// Check the definitions before compiling them.
    fn validate(&self) -> Result<(), PolicyError> {
        for policy in ValidationPolicy::ALL {
            if !self.policies.contains_key(&policy) {
                return Err(PolicyError::MissingPolicy(policy));
            }
        }

        for (policy, definition) in &self.policies {
            if definition.leading_verbs.is_empty() {
                return Err(PolicyError::ValidationError(format!(
                    "{} has no leading verbs",
                    policy
                )));
            }

            for keyword in definition.leading_verbs.iter().chain(&definition.denylist) {
                if !KEYWORD_PATTERN.is_match(keyword.trim()) {
                    return Err(PolicyError::ValidationError(format!(
                        "{}: '{}' is not a single keyword",
                        policy, keyword
                    )));
                }
            }

            let denied = upper_set(&definition.denylist);
            if let Some(verb) = upper_set(&definition.leading_verbs)
                .into_iter()
                .find(|v| denied.contains(v))
            {
                return Err(PolicyError::ValidationError(format!(
                    "{}: leading verb {} is also denylisted",
                    policy, verb
                )));
            }
        }

        let strict = upper_set(&self.policies[&ValidationPolicy::StrictReadOnly].denylist);
        let restricted = upper_set(&self.policies[&ValidationPolicy::RestrictedMutation].denylist);
        if let Some(missing) = restricted.difference(&strict).next() {
            return Err(PolicyError::ValidationError(format!(
                "{} denylist must include every {} keyword; missing {}",
                ValidationPolicy::StrictReadOnly,
                ValidationPolicy::RestrictedMutation,
                missing
            )));
        }

        Ok(())
    }
}

fn upper_set(items: &[String]) -> BTreeSet<String> {
    items.iter().map(|s| s.trim().to_ascii_uppercase()).collect()
}

impl PolicyTable {
    /// The built-in table, compiled once per process.
    pub fn builtin() -> &'static PolicyTable {
        &BUILTIN
    }

    /// Compile a table from validated definitions.
    pub fn from_file(file: PolicyFile) -> Result<Self, PolicyError> {
        file.validate()?;

        let compile = |policy: ValidationPolicy| -> Result<PolicyRules, PolicyError> {
            let definition = file
                .policies
                .get(&policy)
                .ok_or(PolicyError::MissingPolicy(policy))?;
            PolicyRules::compile(policy, definition)
        };

        Ok(Self {
            strict_read_only: compile(ValidationPolicy::StrictReadOnly)?,
            restricted_mutation: compile(ValidationPolicy::RestrictedMutation)?,
        })
    }

    /// Parse a policy table from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, PolicyError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a policy table from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a policy table from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a policy table from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a policy table from a file; `.json` files are read as JSON,
    /// anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_yaml_file(path),
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, PolicyError> {
        validate_policy_schema(&value).map_err(PolicyError::SchemaViolation)?;
        let file: PolicyFile = serde_json::from_value(value)?;
        Self::from_file(file)
    }

    /// Rules for a policy.
    pub fn rules(&self, policy: ValidationPolicy) -> &PolicyRules {
        match policy {
            ValidationPolicy::StrictReadOnly => &self.strict_read_only,
            ValidationPolicy::RestrictedMutation => &self.restricted_mutation,
        }
    }

    /// All policies, in table order.
    pub fn policies(&self) -> impl Iterator<Item = &PolicyRules> {
        [&self.strict_read_only, &self.restricted_mutation].into_iter()
    }

    /// Clean raw text with the policy's sanitizer.
    pub fn clean(&self, raw: &str, policy: ValidationPolicy) -> String {
        self.rules(policy).sanitizer().clean(raw)
    }

    /// Validate a candidate under a policy.
    pub fn validate(&self, candidate: &str, policy: ValidationPolicy) -> ValidationResult {
        validator::validate_with(self.rules(policy), candidate)
    }

    /// Sanitize then validate. Returns the candidate alongside the result so
    /// rejected statements stay available for diagnostics.
    pub fn check(&self, raw: &str, policy: ValidationPolicy) -> (String, ValidationResult) {
        let candidate = self.clean(raw, policy);
        let result = self.validate(&candidate, policy);
        (candidate, result)
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::builtin().clone()
    }
}
