//! Prompt templates for SQL generation.
//!
//! The instruction is pure string interpolation: the schema description is
//! embedded verbatim and nothing else about the request leaks into it.

use sqlward_core::SENTINEL;

/// SQL dialect named in prompts when none is configured.
pub const DEFAULT_DIALECT: &str = "MySQL";

const RULES: &str = r#"CRITICAL RULES:
1. Return ONLY the SQL query - no explanations, no markdown, no code blocks
2. Generate ONLY SELECT queries - never INSERT, UPDATE, DELETE, DROP, or any data-modifying operations
3. Use proper {dialect} syntax
4. If the request cannot be converted to a SELECT query, return: {sentinel}
5. Always use table and column names exactly as shown in the schema
6. Use appropriate JOINs when querying across multiple tables
7. Add appropriate WHERE clauses based on the natural language conditions
8. Use aliases for clarity when joining tables
9. End all queries with a semicolon"#;

const EXAMPLES: &str = r#"IMPORTANT: Your response must contain ONLY the SQL query, nothing else. No explanations, no formatting, no markdown code blocks.

Examples of valid responses:
SELECT * FROM employees;
SELECT name, salary FROM employees WHERE age > 30;
SELECT e.name, d.name AS department FROM employees e JOIN departments d ON e.department_id = d.id;

Examples of INVALID responses:
```sql SELECT * FROM employees; ```
Here's the query: SELECT * FROM employees;
The SQL query would be: SELECT * FROM employees;"#;

/// Instruction and user-turn template for one SQL dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    dialect: String,
}

impl PromptTemplate {
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
        }
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    /// Render the instruction text around a schema description.
    pub fn render(&self, schema_description: &str) -> String {
        let rules = RULES
            .replace("{dialect}", &self.dialect)
            .replace("{sentinel}", SENTINEL);

        format!(
            "You are a {dialect} query generator. Your ONLY job is to convert natural language requests into valid {dialect} SELECT queries.\n\n{rules}\n\n{schema}\n\n{examples}",
            dialect = self.dialect,
            rules = rules,
            schema = schema_description,
            examples = EXAMPLES,
        )
    }

    /// Render the user turn for a request.
    pub fn render_user_turn(&self, user_text: &str) -> String {
        format!(
            "Convert this to a {} SELECT query: {}",
            self.dialect,
            user_text.trim()
        )
    }

    /// Combine instruction and turn for backends that take a single message.
    pub fn single_turn(instruction: &str, turn: &str) -> String {
        format!("{}\n\nUser Request: {}\n\nSQL Query:", instruction, turn)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_DIALECT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SCHEMA: &str = "Database Schema:\n\nTable: employees\nColumns:\n  - id (int) [PRIMARY KEY]\n";

    #[test]
    fn test_instruction_names_sentinel() {
        let prompt = PromptTemplate::default().render(SCHEMA);
        assert!(prompt.contains("ERROR: Cannot generate a valid SELECT query"));
        assert!(prompt.contains("ONLY the SQL query"));
        assert!(prompt.contains("no markdown"));
    }

    #[test]
    fn test_schema_embedded_verbatim() {
        let prompt = PromptTemplate::default().render(SCHEMA);
        assert!(prompt.contains(SCHEMA));
    }

    #[test]
    fn test_dialect_interpolated() {
        let prompt = PromptTemplate::new("PostgreSQL").render("");
        assert!(prompt.starts_with("You are a PostgreSQL query generator."));
        assert!(prompt.contains("3. Use proper PostgreSQL syntax"));
        assert!(!prompt.contains("{dialect}"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = PromptTemplate::default();
        assert_eq!(template.render(SCHEMA), template.render(SCHEMA));
    }

    #[test]
    fn test_user_turn() {
        assert_eq!(
            PromptTemplate::default().render_user_turn("  Show all employees "),
            "Convert this to a MySQL SELECT query: Show all employees"
        );
    }

    #[test]
    fn test_single_turn() {
        let combined = PromptTemplate::single_turn("INSTRUCTION", "Show all employees");
        assert_eq!(
            combined,
            "INSTRUCTION\n\nUser Request: Show all employees\n\nSQL Query:"
        );
    }

    proptest! {
        #[test]
        fn prop_any_schema_embedded_verbatim(schema in "[ -~\n]{0,200}") {
            let prompt = PromptTemplate::default().render(&schema);
            prop_assert!(prompt.contains(&schema));
            prop_assert!(prompt.contains(SENTINEL));
        }
    }
}
