//! Shared detection patterns for the sanitizer and the validator.
//!
//! Everything here is pattern matching, not SQL parsing. The sanitizer uses
//! these to strip conversational wrapping; the validator uses them to refuse
//! anything whose shape is not safe to run.

use lazy_static::lazy_static;
use regex::Regex;

/// Statement terminator.
pub const TERMINATOR: char = ';';

/// Fixed string the model is told to return when no SELECT can represent
/// the request.
pub const SENTINEL: &str = "ERROR: Cannot generate a valid SELECT query";

/// Leading marker of the sentinel. Any candidate starting with it is the
/// model declining, whatever explanation follows.
pub const SENTINEL_MARKER: &str = "ERROR:";

/// Inline and block comment openers.
pub const COMMENT_MARKERS: [&str; 2] = ["--", "/*"];

lazy_static! {
    // =========================================================================
    // RESPONSE WRAPPING
    // =========================================================================

    /// Fenced code-block markers, bare or tagged with a SQL language name.
    pub static ref FENCE_PATTERN: Regex = Regex::new(
        r"(?i)`{3,}(?:(?:postgresql|postgres|mysql|sqlite|tsql|sql)\b)?\s*"
    ).unwrap();

    /// Explanatory prefixes models put in front of the query, anchored at the start.
    pub static ref PREFIX_PATTERN: Regex = Regex::new(
        r"(?i)^\s*(?:here(?:'s|’s| is) the (?:sql )?query:|the sql query would be:|the (?:sql )?query is:|sql query:|query:|sql:)"
    ).unwrap();

    /// A bare keyword-shaped token (used to check policy files).
    pub static ref KEYWORD_PATTERN: Regex = Regex::new(
        r"^[A-Za-z_][A-Za-z0-9_]*$"
    ).unwrap();
}

/// Build a case-insensitive whole-word matcher for a keyword.
///
/// `\b` treats `_` and digits as word characters, so `last_update` or
/// `dropped_at` never match `UPDATE` or `DROP`.
pub fn keyword_pattern(keyword: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
}

/// Build the matcher that extracts the first statement starting with one of
/// `keywords`. The statement runs to the first terminator, or to the end of
/// the text when no terminator follows.
pub fn statement_pattern<S: AsRef<str>>(keywords: &[S]) -> Result<Regex, regex::Error> {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?is)\b(?:{})\s.*?(?:;|\z)", alternation))
}

/// Check if content starts with the sentinel marker (case-insensitive).
pub fn is_sentinel(content: &str) -> bool {
    content
        .trim_start()
        .get(..SENTINEL_MARKER.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(SENTINEL_MARKER))
}

/// First comment marker found in content, if any.
pub fn find_comment_marker(content: &str) -> Option<&'static str> {
    COMMENT_MARKERS
        .iter()
        .copied()
        .find(|marker| content.contains(marker))
}

/// Number of statement terminators in content.
pub fn count_terminators(content: &str) -> usize {
    content.matches(TERMINATOR).count()
}

/// The leading word of a statement, without surrounding punctuation.
pub fn leading_token(content: &str) -> &str {
    let trimmed = content.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}
