//! Safety validator: accepts or refuses a candidate statement under a policy.
//!
//! A linear chain of pure guards, short-circuiting on the first failure:
//!
//! | # | guard            | reason                              |
//! |---|------------------|-------------------------------------|
//! | 1 | empty            | `empty`                             |
//! | 2 | sentinel         | the sentinel text itself            |
//! | 3 | leading verb     | `operation not permitted`           |
//! | 4 | single statement | `multiple statements not allowed`   |
//! | 5 | no comments      | `comments not allowed`              |
//! | 6 | denylist         | `forbidden operation: {keyword}`    |
//!
//! Structural guards (4, 5) run before the keyword scan, so a stacked
//! statement is reported as stacking even when the second statement also
//! contains a denylisted keyword.

use crate::patterns;
use crate::policy::PolicyRules;
use crate::types::{Rejection, ValidationResult};

/// Validate a candidate against one policy's rules.
pub fn validate_with(rules: &PolicyRules, candidate: &str) -> ValidationResult {
    run_guards(rules, candidate)
        .map(|()| candidate.to_string())
        .into()
}

fn run_guards(rules: &PolicyRules, candidate: &str) -> Result<(), Rejection> {
    check_not_empty(candidate)?;
    check_not_sentinel(candidate)?;
    check_leading_verb(rules, candidate)?;
    check_single_statement(candidate)?;
    check_no_comments(candidate)?;
    check_denylist(rules, candidate)?;
    Ok(())
}

/// Guard 1: the candidate has content.
pub fn check_not_empty(candidate: &str) -> Result<(), Rejection> {
    if candidate.trim().is_empty() {
        return Err(Rejection::Empty);
    }
    Ok(())
}

/// Guard 2: the model did not decline with the sentinel token.
pub fn check_not_sentinel(candidate: &str) -> Result<(), Rejection> {
    if patterns::is_sentinel(candidate) {
        return Err(Rejection::Sentinel(candidate.trim().to_string()));
    }
    Ok(())
}

/// Guard 3: the first token is a verb the policy allows.
pub fn check_leading_verb(rules: &PolicyRules, candidate: &str) -> Result<(), Rejection> {
    let verb = patterns::leading_token(candidate);
    if rules.allows_leading_verb(verb) {
        Ok(())
    } else {
        Err(Rejection::OperationNotPermitted {
            verb: verb.to_ascii_uppercase(),
        })
    }
}

/// Guard 4: at most one statement terminator.
pub fn check_single_statement(candidate: &str) -> Result<(), Rejection> {
    let terminators = patterns::count_terminators(candidate);
    if terminators > 1 {
        return Err(Rejection::MultipleStatements { terminators });
    }
    Ok(())
}

/// Guard 5: no inline or block comment markers anywhere.
pub fn check_no_comments(candidate: &str) -> Result<(), Rejection> {
    match patterns::find_comment_marker(candidate) {
        Some(marker) => Err(Rejection::CommentsNotAllowed { marker }),
        None => Ok(()),
    }
}

/// Guard 6: no denylisted keyword as a whole word.
pub fn check_denylist(rules: &PolicyRules, candidate: &str) -> Result<(), Rejection> {
    match rules.find_denied_keyword(candidate) {
        Some(keyword) => Err(Rejection::ForbiddenKeyword {
            keyword: keyword.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::SENTINEL;
    use crate::policy::PolicyTable;
    use crate::types::{Guard, ValidationPolicy};
    use proptest::prelude::*;

    fn strict(candidate: &str) -> ValidationResult {
        PolicyTable::builtin().validate(candidate, ValidationPolicy::StrictReadOnly)
    }

    fn restricted(candidate: &str) -> ValidationResult {
        PolicyTable::builtin().validate(candidate, ValidationPolicy::RestrictedMutation)
    }

    fn reason(result: ValidationResult) -> String {
        result.rejection().map(Rejection::reason).unwrap_or_default()
    }

    #[test]
    fn test_simple_select_is_valid() {
        assert_eq!(
            strict("SELECT * FROM employees;"),
            ValidationResult::Valid("SELECT * FROM employees;".to_string())
        );
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(reason(strict("")), "empty");
        assert_eq!(reason(restricted("   ")), "empty");
    }

    #[test]
    fn test_sentinel_reason_is_sentinel_text() {
        assert_eq!(reason(strict(SENTINEL)), SENTINEL);
        assert_eq!(reason(restricted(SENTINEL)), SENTINEL);
        assert!(strict(SENTINEL).rejection().unwrap().is_sentinel());
    }

    #[test]
    fn test_non_select_leading_verb_rejected() {
        assert_eq!(reason(strict("SHOW TABLES;")), "operation not permitted");
        assert_eq!(
            reason(strict("UPDATE employees SET salary = 1 WHERE id = 1;")),
            "operation not permitted"
        );
        assert_eq!(
            strict("WITH x AS (SELECT 1) SELECT * FROM x;")
                .rejection()
                .unwrap()
                .guard(),
            Guard::LeadingVerb
        );
    }

    #[test]
    fn test_lowercase_leading_verb_accepted() {
        assert!(strict("select name from employees;").is_valid());
    }

    #[test]
    fn test_stacked_statement_reports_multiple_statements() {
        assert_eq!(
            reason(strict("SELECT * FROM employees; DROP TABLE employees;")),
            "multiple statements not allowed"
        );
        assert_eq!(
            reason(restricted("DELETE FROM t WHERE id = 1; DELETE FROM u;")),
            "multiple statements not allowed"
        );
    }

    #[test]
    fn test_comments_rejected() {
        assert_eq!(
            reason(strict("SELECT * FROM employees -- WHERE id = 1")),
            "comments not allowed"
        );
        assert_eq!(
            reason(strict("SELECT /* hidden */ name FROM employees;")),
            "comments not allowed"
        );
    }

    #[test]
    fn test_denylisted_keyword_rejected() {
        assert_eq!(
            reason(strict("SELECT * FROM employees WHERE id IN (DELETE FROM t);")),
            "forbidden operation: DELETE"
        );
        assert_eq!(
            reason(strict("SELECT REPLACE(name, 'a', 'b') FROM employees;")),
            "forbidden operation: REPLACE"
        );
    }

    #[test]
    fn test_keyword_inside_identifier_allowed() {
        assert!(strict("SELECT last_update, dropped_at, created_by FROM audit_log;").is_valid());
        assert!(strict("SELECT grantee FROM updates_view;").is_valid());
    }

    #[test]
    fn test_restricted_mutation_scenarios() {
        assert!(restricted("UPDATE employees SET salary = 1 WHERE id = 1;").is_valid());
        assert!(restricted("INSERT INTO employees (name) VALUES ('John');").is_valid());
        assert!(restricted("DELETE FROM employees WHERE id = 7;").is_valid());
        assert!(restricted("SELECT * FROM employees;").is_valid());
        assert_eq!(
            reason(restricted("DROP TABLE employees;")),
            "operation not permitted"
        );
    }

    #[test]
    fn test_restricted_still_blocks_schema_keywords() {
        assert_eq!(
            reason(restricted("INSERT INTO t SELECT * FROM x WHERE 1 = 1 AND truncate = 1;")),
            "forbidden operation: TRUNCATE"
        );
        assert_eq!(
            reason(restricted("UPDATE users SET role = 'admin' WHERE grant = 1;")),
            "forbidden operation: GRANT"
        );
    }

    #[test]
    fn test_individual_guards() {
        assert!(check_not_empty("x").is_ok());
        assert!(check_not_sentinel("SELECT 1;").is_ok());
        assert!(check_single_statement("SELECT 1;").is_ok());
        assert!(check_single_statement("SELECT 1").is_ok());
        assert!(check_no_comments("SELECT '-' FROM t;").is_ok());

        let rules = PolicyTable::builtin().rules(ValidationPolicy::StrictReadOnly);
        assert!(check_leading_verb(rules, "SELECT 1;").is_ok());
        assert_eq!(
            check_denylist(rules, "SELECT 1; drop table t"),
            Err(Rejection::ForbiddenKeyword {
                keyword: "DROP".to_string()
            })
        );
    }

    const STRICT_DENYLIST: [&str; 17] = [
        "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
        "EXECUTE", "EXEC", "MERGE", "CALL", "LOAD", "REPLACE", "LOCK", "UNLOCK",
    ];

    fn mixed_case(keyword: &str, mask: u32) -> String {
        keyword
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if mask & (1 << (i % 32)) != 0 {
                    c.to_ascii_lowercase()
                } else {
                    c
                }
            })
            .collect()
    }

    proptest! {
        #[test]
        fn prop_whole_word_keyword_always_rejected(
            index in 0..STRICT_DENYLIST.len(),
            mask in any::<u32>(),
            left in prop::sample::select(vec![" ", "(", ",", "=", "\n", "'"]),
            right in prop::sample::select(vec![" ", ")", ",", "=", "\n", "'"]),
        ) {
            let keyword = mixed_case(STRICT_DENYLIST[index], mask);
            let candidate = format!("SELECT a FROM t WHERE b{}{}{}1;", left, keyword, right);
            let result = strict(&candidate);
            prop_assert!(!result.is_valid());
        }

        #[test]
        fn prop_keyword_inside_identifier_not_rejected(
            index in 0..STRICT_DENYLIST.len(),
            prefix in "[a-z]{1,4}_?",
            suffix in "_?[a-z0-9]{1,4}",
        ) {
            let keyword = STRICT_DENYLIST[index].to_ascii_lowercase();
            let candidate = format!("SELECT {}{}{} FROM t;", prefix, keyword, suffix);
            let result = strict(&candidate);
            prop_assert!(result.is_valid(), "rejected {:?}: {:?}", candidate, result);
        }

        #[test]
        fn prop_multiple_terminators_always_rejected(
            body in "[a-z ]{0,20}",
            extra in 2usize..5,
            restricted_policy in any::<bool>(),
        ) {
            let candidate = format!("SELECT {}{}", body, ";".repeat(extra));
            let result = if restricted_policy { restricted(&candidate) } else { strict(&candidate) };
            prop_assert!(!result.is_valid());
        }
    }
}
