//! Common type definitions for the database service
//!
//! Shared types used across the database service modules.

use serde::{Deserialize, Serialize};

/// Query result row: ordered column name to value map.
///
/// serde_json's `preserve_order` feature keeps the driver's column order
/// intact through conversion and serialization.
pub type QueryRow = serde_json::Map<String, serde_json::Value>;

/// Column-value data mapping for insert and update operations.
///
/// Placeholder numbering and the parameter vector follow this map's
/// iteration order.
pub type QueryParams = serde_json::Map<String, serde_json::Value>;

/// Row cap applied to selects that do not set a limit of their own.
pub const DEFAULT_ROW_LIMIT: u64 = 100;

/// A filter clause plus the values bound to its placeholders, in order.
///
/// The clause is a SQL boolean expression using the legacy `%s` placeholder
/// token; the query builder rewrites each occurrence into positional `$N`
/// syntax before execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub clause: String,
    pub params: Vec<serde_json::Value>,
}

/// Column definition for CREATE TABLE.
///
/// `sql_type` is injected into the DDL text verbatim. Callers are trusted;
/// nothing here is validated or escaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(alias = "type", alias = "sqlType")]
    pub sql_type: String,
}

/// One column of a table schema description, in catalog ordinal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: String,
    pub column_default: Option<String>,
}

/// Options for a filtered select.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOptions {
    /// Projection; `None` or an empty list selects `*`
    pub columns: Option<Vec<String>>,

    /// Filter; when absent the whole table matches
    pub condition: Option<Condition>,

    /// Appended verbatim as `ORDER BY ...`
    pub order_by: Option<String>,

    /// Row cap; `None` leaves the result set unbounded
    pub limit: Option<u64>,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            columns: None,
            condition: None,
            order_by: None,
            limit: Some(DEFAULT_ROW_LIMIT),
        }
    }
}

/// SQL text plus the positional parameter vector, ready for execution.
/// Built, executed, and discarded within a single operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<serde_json::Value>,
}

/// Result of an update operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub rows_updated: u64,
    pub updated_data: Vec<QueryRow>,
}

/// Result of a delete operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub rows_deleted: u64,
    pub deleted_data: Vec<QueryRow>,
}

/// Connection pool statistics snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub active_connections: u32,
    pub idle_connections: u32,
    pub max_connections: u32,
    pub connection_errors: u64,
    pub total_queries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_options_default_to_the_row_cap() {
        let options = SelectOptions::default();
        assert_eq!(options.limit, Some(DEFAULT_ROW_LIMIT));
        assert!(options.columns.is_none());
        assert!(options.condition.is_none());
    }

    #[test]
    fn column_spec_accepts_the_short_type_key() {
        let column: ColumnSpec =
            serde_json::from_str(r#"{"name": "id", "type": "SERIAL PRIMARY KEY"}"#).unwrap();
        assert_eq!(column.sql_type, "SERIAL PRIMARY KEY");
    }
}
