//! Catalog introspection
//!
//! Table listing and schema description against information_schema views.

use crate::service::db::core::executor::QueryExecutor;
use crate::service::db::core::types::ColumnSchema;
use crate::tool::error::AppError;
use tracing::{debug, info};

/// Metadata provider for database schema information
pub struct MetadataProvider {
    /// Query executor
    executor: QueryExecutor,
}

impl MetadataProvider {
    /// Creates a new metadata provider.
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// Lists every table in the public schema, ordered by name.
    pub async fn get_tables(&self) -> Result<Vec<String>, AppError> {
        let sql = r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = 'public'
            ORDER BY table_name
        "#;

        let rows = self.executor.fetch_rows(sql, &[]).await?;

        let tables: Vec<String> = rows
            .iter()
            .filter_map(|row| {
                row.get("table_name")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .collect();

        info!("Retrieved {} tables", tables.len());
        Ok(tables)
    }

    /// Describes the columns of one table in ordinal order.
    pub async fn get_table_schema(&self, table_name: &str) -> Result<Vec<ColumnSchema>, AppError> {
        let sql = r#"
            SELECT column_name, data_type, is_nullable, column_default
            FROM information_schema.columns
            WHERE table_name = $1 AND table_schema = 'public'
            ORDER BY ordinal_position
        "#;

        let params = [serde_json::Value::String(table_name.to_string())];
        let rows = self.executor.fetch_rows(sql, &params).await?;

        let columns: Vec<ColumnSchema> = rows
            .iter()
            .map(|row| ColumnSchema {
                column_name: row
                    .get("column_name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                data_type: row
                    .get("data_type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                is_nullable: row
                    .get("is_nullable")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                column_default: row
                    .get("column_default")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            })
            .collect();

        debug!(
            "Retrieved schema for table '{}' ({} columns)",
            table_name,
            columns.len()
        );
        Ok(columns)
    }

    /// Checks whether a table exists in the public schema.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool, AppError> {
        let sql = r#"
            SELECT 1 AS present
            FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = $1
        "#;

        let params = [serde_json::Value::String(table_name.to_string())];
        let rows = self.executor.fetch_rows(sql, &params).await?;
        Ok(!rows.is_empty())
    }
}
