//! Validation policy tables.
//!
//! Each [`ValidationPolicy`](crate::ValidationPolicy) maps to a set of
//! allowed leading verbs and a keyword denylist. The built-in table is
//! compiled once; custom tables load from YAML or JSON and are checked
//! against a JSON Schema plus a few semantic rules.

mod schema;
mod table;

pub use schema::validate_policy_schema;
pub use table::{PolicyDefinition, PolicyError, PolicyFile, PolicyRules, PolicyTable};
