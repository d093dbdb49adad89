//! Database schema descriptions handed to the model.
//!
//! The core never queries a database. Callers supply table metadata (or an
//! opaque description string); this module only renders it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Text used when no table metadata is available.
pub const SCHEMA_UNAVAILABLE: &str = "Unable to retrieve database schema.";

/// Errors from loading or rendering a schema description.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("schema has no tables")]
    Empty,
}

/// Key role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    #[default]
    None,
    Primary,
    Foreign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: String,

    #[serde(default)]
    pub key: ColumnKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,

    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
}

/// Table metadata for one database.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatabaseSchema {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            key: ColumnKey::None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.key = ColumnKey::Primary;
        self
    }

    pub fn foreign_key(mut self) -> Self {
        self.key = ColumnKey::Foreign;
        self
    }
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

impl DatabaseSchema {
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self { tables }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the description embedded in the instruction prompt.
    pub fn describe(&self) -> Result<String, CatalogError> {
        if self.tables.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut out = String::from("Database Schema:\n");
        for table in &self.tables {
            out.push_str(&format!("\nTable: {}\n", table.name));
            out.push_str("Columns:\n");
            for column in &table.columns {
                out.push_str(&format!("  - {} ({})", column.name, column.data_type));
                match column.key {
                    ColumnKey::Primary => out.push_str(" [PRIMARY KEY]"),
                    ColumnKey::Foreign => out.push_str(" [FOREIGN KEY]"),
                    ColumnKey::None => {}
                }
                out.push('\n');
            }
        }

        Ok(out)
    }

    /// Like [`describe`](Self::describe), but an empty schema renders the
    /// fixed "unavailable" text.
    pub fn describe_or_fallback(&self) -> String {
        self.describe()
            .unwrap_or_else(|_| SCHEMA_UNAVAILABLE.to_string())
    }
}

/// Load a schema description from a file.
///
/// `.yaml`/`.yml`/`.json` files are parsed as [`DatabaseSchema`] and rendered;
/// anything else is taken verbatim as an opaque description.
pub fn load_description(path: impl AsRef<Path>) -> Result<String, CatalogError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let schema = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => DatabaseSchema::from_yaml(&contents)?,
        Some("json") => DatabaseSchema::from_json(&contents)?,
        _ => return Ok(contents),
    };

    Ok(schema.describe_or_fallback())
}
