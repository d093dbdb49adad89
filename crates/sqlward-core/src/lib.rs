//! # sqlward-core
//!
//! Deterministic safety layer for model-generated SQL.
//!
//! Model output is untrusted input. This crate reduces it to a single
//! candidate statement and then accepts or refuses that statement under a
//! named policy:
//!
//! - **Sanitizer**: strips fences and explanatory prefixes, extracts the
//!   first statement, appends the terminator
//! - **Validator**: a short-circuiting chain of pure guards
//! - **Policy tables**: leading verbs and keyword denylists, as data
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same input always produces the same result
//! 2. **No LLM calls, no I/O**: beyond optional policy/schema file loading
//! 3. **Reentrant**: shared state is read-only after construction
//!
//! ## Example
//!
//! ```rust
//! use sqlward_core::{PolicyTable, ValidationPolicy};
//!
//! let table = PolicyTable::builtin();
//! let (candidate, result) = table.check(
//!     "```sql SELECT * FROM employees```",
//!     ValidationPolicy::StrictReadOnly,
//! );
//! assert_eq!(candidate, "SELECT * FROM employees;");
//! assert!(result.is_valid());
//! ```

pub mod catalog;
pub mod patterns;
pub mod policy;
pub mod report;
pub mod sanitizer;
pub mod types;
pub mod validator;

pub use catalog::{CatalogError, ColumnKey, ColumnSchema, DatabaseSchema, TableSchema};
pub use patterns::SENTINEL;
pub use policy::{PolicyDefinition, PolicyError, PolicyFile, PolicyRules, PolicyTable};
pub use report::{OutcomeCategory, OutcomeReport};
pub use sanitizer::Sanitizer;
pub use types::{Guard, Rejection, UnknownPolicy, ValidationPolicy, ValidationResult};

/// Clean raw model output with the default `SELECT` sanitizer.
pub fn clean(raw: &str) -> String {
    Sanitizer::new().clean(raw)
}

/// Validate a candidate against the built-in policy table.
pub fn validate(candidate: &str, policy: ValidationPolicy) -> ValidationResult {
    PolicyTable::builtin().validate(candidate, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_select_end_to_end() {
        let candidate = clean("```sql SELECT * FROM employees```");
        assert_eq!(candidate, "SELECT * FROM employees;");
        assert_eq!(
            validate(&candidate, ValidationPolicy::StrictReadOnly),
            ValidationResult::Valid("SELECT * FROM employees;".to_string())
        );
    }

    #[test]
    fn test_stacked_statement_end_to_end() {
        let raw = "SELECT * FROM employees; DROP TABLE employees;";
        let result = validate(raw, ValidationPolicy::StrictReadOnly);
        assert_eq!(
            result.rejection().map(Rejection::reason).as_deref(),
            Some("multiple statements not allowed")
        );
    }

    #[test]
    fn test_sentinel_end_to_end() {
        let candidate = clean(SENTINEL);
        let result = validate(&candidate, ValidationPolicy::StrictReadOnly);
        assert_eq!(result.rejection().map(Rejection::reason).as_deref(), Some(SENTINEL));
    }

    #[test]
    fn test_well_formed_select_roundtrips() {
        let sql = "SELECT name, salary FROM employees WHERE salary > 50000 ORDER BY salary DESC";
        let candidate = clean(sql);
        assert_eq!(candidate, format!("{};", sql));
        assert!(validate(&candidate, ValidationPolicy::StrictReadOnly).is_valid());
    }
}
