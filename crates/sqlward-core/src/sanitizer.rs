//! Response sanitizer: reduces raw model output to one candidate statement.
//!
//! The pass is deterministic and order-sensitive:
//! 1. Strip fenced code-block markers
//! 2. Strip known explanatory prefixes at the start
//! 3. Trim whitespace
//! 4. Extract the first statement that starts with a leading keyword
//! 5. Ensure a trailing terminator
//!
//! It never repairs SQL. The validator decides what the candidate is worth.

use regex::Regex;

use crate::patterns::{self, FENCE_PATTERN, PREFIX_PATTERN, TERMINATOR};

/// Leading keyword used when none is configured.
pub const DEFAULT_LEADING_KEYWORD: &str = "SELECT";

/// Extracts a single candidate statement from arbitrary model output.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    statement: Regex,
}

impl Sanitizer {
    /// Sanitizer extracting `SELECT` statements.
    pub fn new() -> Self {
        Self::with_leading_keywords(&[DEFAULT_LEADING_KEYWORD])
            .expect("default leading keyword compiles")
    }

    /// Sanitizer extracting statements that start with any of `keywords`.
    pub fn with_leading_keywords<S: AsRef<str>>(keywords: &[S]) -> Result<Self, regex::Error> {
        Ok(Self {
            statement: patterns::statement_pattern(keywords)?,
        })
    }

    /// Clean raw model output into a candidate statement.
    ///
    /// `clean(clean(x)) == clean(x)` for every input.
    pub fn clean(&self, raw: &str) -> String {
        let unfenced = strip_fences(raw);
        let unprefixed = strip_prefixes(&unfenced);
        let text = unprefixed.trim();

        // The sentinel passes through untouched so the validator can surface it.
        if patterns::is_sentinel(text) {
            return text.to_string();
        }

        let mut candidate = match self.statement.find(text) {
            Some(m) => {
                if m.start() > 0 || m.end() < text.len() {
                    tracing::debug!(
                        discarded = text.len() - m.as_str().len(),
                        "Extracted statement from surrounding text"
                    );
                }
                m.as_str().to_string()
            }
            None => text.to_string(),
        };

        if !candidate.is_empty() && !candidate.ends_with(TERMINATOR) {
            candidate.push(TERMINATOR);
        }

        candidate
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove every fence marker, repeating until none is left.
fn strip_fences(text: &str) -> String {
    let mut current = text.to_string();
    while FENCE_PATTERN.is_match(&current) {
        current = FENCE_PATTERN.replace_all(&current, "").into_owned();
    }
    current
}

/// Remove explanatory prefixes from the start, repeating for stacked ones.
fn strip_prefixes(text: &str) -> String {
    let mut current = text.to_string();
    while let Some(m) = PREFIX_PATTERN.find(&current) {
        current = current[m.end()..].to_string();
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::SENTINEL;
    use proptest::prelude::*;

    fn clean(raw: &str) -> String {
        Sanitizer::new().clean(raw)
    }

    #[test]
    fn test_fenced_block() {
        assert_eq!(
            clean("```sql SELECT * FROM employees```"),
            "SELECT * FROM employees;"
        );
        assert_eq!(
            clean("```mysql\nSELECT name FROM employees;\n```"),
            "SELECT name FROM employees;"
        );
        assert_eq!(clean("```\nSELECT 1;\n```"), "SELECT 1;");
    }

    #[test]
    fn test_prefixes_removed() {
        assert_eq!(
            clean("Here's the query: SELECT * FROM employees;"),
            "SELECT * FROM employees;"
        );
        assert_eq!(
            clean("query: Query: SELECT id FROM departments"),
            "SELECT id FROM departments;"
        );
        assert_eq!(
            clean("The SQL query would be: SELECT * FROM employees;"),
            "SELECT * FROM employees;"
        );
    }

    #[test]
    fn test_surrounding_prose_discarded() {
        assert_eq!(
            clean("Sure. SELECT * FROM employees WHERE age > 30; This returns older staff."),
            "SELECT * FROM employees WHERE age > 30;"
        );
    }

    #[test]
    fn test_only_first_statement_kept() {
        assert_eq!(
            clean("SELECT * FROM employees; DROP TABLE employees;"),
            "SELECT * FROM employees;"
        );
    }

    #[test]
    fn test_unchanged_when_no_leading_keyword() {
        assert_eq!(clean("DROP TABLE employees"), "DROP TABLE employees;");
        assert_eq!(clean("  I cannot help with that.  "), "I cannot help with that.;");
    }

    #[test]
    fn test_empty_stays_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   \n"), "");
        assert_eq!(clean("```sql\n```"), "");
    }

    #[test]
    fn test_sentinel_passes_through() {
        assert_eq!(clean(SENTINEL), SENTINEL);
        assert_eq!(clean(&format!("```\n{}\n```", SENTINEL)), SENTINEL);
    }

    #[test]
    fn test_well_formed_select_unchanged() {
        let sql = "SELECT e.name, d.name AS department FROM employees e JOIN departments d ON e.department_id = d.id;";
        assert_eq!(clean(sql), sql);
        assert_eq!(clean("SELECT 1"), "SELECT 1;");
    }

    #[test]
    fn test_custom_leading_keywords() {
        let sanitizer = Sanitizer::with_leading_keywords(&["SELECT", "UPDATE"]).unwrap();
        assert_eq!(
            sanitizer.clean("Here is the query: UPDATE employees SET salary = 1 WHERE id = 1"),
            "UPDATE employees SET salary = 1 WHERE id = 1;"
        );
    }

    #[test]
    fn test_identifier_containing_keyword_not_extracted() {
        assert_eq!(
            clean("preselected_items"),
            "preselected_items;"
        );
    }

    fn wrapped_text() -> impl Strategy<Value = String> {
        let fragment = prop_oneof![
            Just("```".to_string()),
            Just("```sql".to_string()),
            Just("Here's the query:".to_string()),
            Just("Query:".to_string()),
            Just("SELECT".to_string()),
            Just("select".to_string()),
            Just(";".to_string()),
            Just("ERROR:".to_string()),
            Just("\n".to_string()),
            "[a-zA-Z0-9_ *=',.()`-]{0,12}",
        ];
        prop::collection::vec(fragment, 0..10).prop_map(|parts| parts.join(" "))
    }

    proptest! {
        #[test]
        fn prop_clean_is_idempotent(raw in wrapped_text()) {
            let once = clean(&raw);
            prop_assert_eq!(clean(&once), once);
        }

        #[test]
        fn prop_clean_is_idempotent_on_arbitrary_text(raw in "[ -~\n\t]{0,64}") {
            let once = clean(&raw);
            prop_assert_eq!(clean(&once), once);
        }

        #[test]
        fn prop_nonempty_candidates_are_terminated(raw in wrapped_text()) {
            let cleaned = clean(&raw);
            prop_assert!(cleaned.is_empty() || cleaned.ends_with(';') || patterns::is_sentinel(&cleaned));
        }
    }
}
