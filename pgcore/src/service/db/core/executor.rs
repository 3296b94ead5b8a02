//! Statement execution
//!
//! Sends built statements through a pool-acquired connection and converts
//! driver rows into the uniform row representation. A connection is held
//! for one call only and released on every path, including driver failure.

use crate::service::db::core::config::QueryConfig;
use crate::service::db::core::connection::ConnectionManager;
use crate::service::db::core::types::QueryRow;
use crate::tool::error::AppError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{query, Column, Postgres, Row, TypeInfo};
use std::time::Instant;
use tracing::{debug, warn};

/// Query executor for database operations
pub struct QueryExecutor {
    /// Connection manager
    connection: ConnectionManager,

    /// Query settings
    config: QueryConfig,
}

impl QueryExecutor {
    /// Creates a new query executor.
    pub fn new(connection: ConnectionManager, config: QueryConfig) -> Self {
        Self { connection, config }
    }

    /// Executes a statement expected to produce rows: SELECT, or any
    /// statement carrying a RETURNING clause.
    pub async fn fetch_rows(
        &self,
        sql: &str,
        params: &[serde_json::Value],
    ) -> Result<Vec<QueryRow>, AppError> {
        self.log_query(sql, params);

        let start = Instant::now();
        let mut conn = self.connection.acquire().await?;

        let result = Self::bind_params(query(sql), params)
            .fetch_all(&mut *conn)
            .await;

        drop(conn);
        self.connection.release();

        let rows = result.map_err(|e| {
            warn!("Query execution failed: {}", e);
            AppError::from(e)
        })?;
        self.connection.record_query();

        let elapsed = start.elapsed();
        self.check_slow_query(sql, elapsed.as_millis() as u64);

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            results.push(Self::row_to_map(row));
        }

        debug!("Query returned {} rows in {:?}", results.len(), elapsed);
        Ok(results)
    }

    /// Executes a statement and returns its first row, if any.
    pub async fn fetch_optional_row(
        &self,
        sql: &str,
        params: &[serde_json::Value],
    ) -> Result<Option<QueryRow>, AppError> {
        self.log_query(sql, params);

        let start = Instant::now();
        let mut conn = self.connection.acquire().await?;

        let result = Self::bind_params(query(sql), params)
            .fetch_optional(&mut *conn)
            .await;

        drop(conn);
        self.connection.release();

        let row = result.map_err(|e| {
            warn!("Query execution failed: {}", e);
            AppError::from(e)
        })?;
        self.connection.record_query();

        self.check_slow_query(sql, start.elapsed().as_millis() as u64);

        Ok(row.as_ref().map(Self::row_to_map))
    }

    /// Executes a statement with no row output (DDL and similar). Returns
    /// the affected-row count reported by the driver.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[serde_json::Value],
    ) -> Result<u64, AppError> {
        self.log_query(sql, params);

        let start = Instant::now();
        let mut conn = self.connection.acquire().await?;

        let result = Self::bind_params(query(sql), params)
            .execute(&mut *conn)
            .await;

        drop(conn);
        self.connection.release();

        let done = result.map_err(|e| {
            warn!("Statement execution failed: {}", e);
            AppError::from(e)
        })?;
        self.connection.record_query();

        self.check_slow_query(sql, start.elapsed().as_millis() as u64);

        Ok(done.rows_affected())
    }

    /// Binds dynamic parameters by their JSON type.
    fn bind_params<'q>(
        mut query_builder: sqlx::query::Query<'q, Postgres, PgArguments>,
        params: &'q [serde_json::Value],
    ) -> sqlx::query::Query<'q, Postgres, PgArguments> {
        for value in params {
            query_builder = match value {
                serde_json::Value::String(s) => query_builder.bind(s.clone()),
                serde_json::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        query_builder.bind(i)
                    } else if let Some(f) = n.as_f64() {
                        query_builder.bind(f)
                    } else {
                        query_builder.bind(n.to_string())
                    }
                }
                serde_json::Value::Bool(b) => query_builder.bind(*b),
                serde_json::Value::Null => query_builder.bind(Option::<String>::None),
                other => query_builder.bind(other.to_string()),
            };
        }
        query_builder
    }

    /// Converts a driver row into the ordered column name to value map.
    fn row_to_map(row: &PgRow) -> QueryRow {
        let mut result = QueryRow::new();

        for (idx, column) in row.columns().iter().enumerate() {
            let value = match column.type_info().name() {
                "INT2" => row
                    .try_get::<Option<i16>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| serde_json::Value::from(v as i64))
                    .unwrap_or(serde_json::Value::Null),
                "INT4" => row
                    .try_get::<Option<i32>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| serde_json::Value::from(v as i64))
                    .unwrap_or(serde_json::Value::Null),
                "INT8" => row
                    .try_get::<Option<i64>, _>(idx)
                    .ok()
                    .flatten()
                    .map(serde_json::Value::from)
                    .unwrap_or(serde_json::Value::Null),
                "FLOAT4" => row
                    .try_get::<Option<f32>, _>(idx)
                    .ok()
                    .flatten()
                    .and_then(|v| serde_json::Number::from_f64(v as f64))
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
                "FLOAT8" => row
                    .try_get::<Option<f64>, _>(idx)
                    .ok()
                    .flatten()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
                "NUMERIC" => row
                    .try_get::<Option<Decimal>, _>(idx)
                    .ok()
                    .flatten()
                    .and_then(|v| v.to_f64())
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
                "BOOL" => row
                    .try_get::<Option<bool>, _>(idx)
                    .ok()
                    .flatten()
                    .map(serde_json::Value::Bool)
                    .unwrap_or(serde_json::Value::Null),
                "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
                    .try_get::<Option<String>, _>(idx)
                    .ok()
                    .flatten()
                    .map(serde_json::Value::String)
                    .unwrap_or(serde_json::Value::Null),
                // Raw bytes travel as hex text
                "BYTEA" => row
                    .try_get::<Option<Vec<u8>>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| serde_json::Value::String(hex::encode(v)))
                    .unwrap_or(serde_json::Value::Null),
                "TIMESTAMP" => row
                    .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| serde_json::Value::String(v.to_string()))
                    .unwrap_or(serde_json::Value::Null),
                "TIMESTAMPTZ" => row
                    .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| serde_json::Value::String(v.to_rfc3339()))
                    .unwrap_or(serde_json::Value::Null),
                "DATE" => row
                    .try_get::<Option<chrono::NaiveDate>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| serde_json::Value::String(v.to_string()))
                    .unwrap_or(serde_json::Value::Null),
                "TIME" => row
                    .try_get::<Option<chrono::NaiveTime>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| serde_json::Value::String(v.to_string()))
                    .unwrap_or(serde_json::Value::Null),
                "UUID" => row
                    .try_get::<Option<uuid::Uuid>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| serde_json::Value::String(v.to_string()))
                    .unwrap_or(serde_json::Value::Null),
                "JSON" | "JSONB" => row
                    .try_get::<Option<serde_json::Value>, _>(idx)
                    .ok()
                    .flatten()
                    .unwrap_or(serde_json::Value::Null),
                // Fallback: whatever decodes as text
                _ => row
                    .try_get::<Option<String>, _>(idx)
                    .ok()
                    .flatten()
                    .map(serde_json::Value::String)
                    .unwrap_or(serde_json::Value::Null),
            };

            result.insert(column.name().to_string(), value);
        }

        result
    }

    /// Logs the statement when query logging is enabled.
    fn log_query(&self, sql: &str, params: &[serde_json::Value]) {
        if self.config.enable_query_logging {
            if params.is_empty() {
                debug!("Executing query: {}", sql);
            } else {
                debug!("Executing query: {} | Params: {:?}", sql, params);
            }
        }
    }

    /// Warns when a statement ran longer than the configured threshold.
    fn check_slow_query(&self, sql: &str, elapsed_ms: u64) {
        if elapsed_ms > self.config.slow_query_threshold_ms {
            warn!(
                "Slow query detected ({} ms): {}",
                elapsed_ms,
                sql.chars().take(200).collect::<String>()
            );
        }
    }
}
