//! Operation facade
//!
//! The high-level database operations exposed to external callers, composed
//! from the connection manager, query builder, and statement executor. Each
//! operation is a single request with no state carried across calls.

use crate::service::db::core::{
    config::DbServiceConfig,
    connection::ConnectionManager,
    executor::QueryExecutor,
    metadata::MetadataProvider,
    query,
    types::{
        ColumnSchema, ColumnSpec, Condition, ConnectionStats, DeleteOutcome, QueryParams,
        QueryRow, SelectOptions, UpdateOutcome,
    },
};
use crate::tool::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// High-level database operations.
#[async_trait]
pub trait DbService: Send + Sync {
    // === Introspection ===
    async fn get_tables(&self) -> Result<Vec<String>, AppError>;
    async fn get_table_schema(&self, table: &str) -> Result<Vec<ColumnSchema>, AppError>;
    async fn table_exists(&self, table: &str) -> Result<bool, AppError>;

    // === Query operations ===
    async fn execute_query(&self, sql: &str) -> Result<Vec<QueryRow>, AppError>;

    async fn select_rows(
        &self,
        table: &str,
        options: SelectOptions,
    ) -> Result<Vec<QueryRow>, AppError>;

    async fn insert_row(
        &self,
        table: &str,
        data: QueryParams,
    ) -> Result<Option<QueryRow>, AppError>;

    async fn update_rows(
        &self,
        table: &str,
        data: QueryParams,
        condition: Condition,
    ) -> Result<UpdateOutcome, AppError>;

    async fn delete_rows(
        &self,
        table: &str,
        condition: Condition,
    ) -> Result<DeleteOutcome, AppError>;

    // === DDL operations ===
    async fn create_table(&self, table: &str, columns: &[ColumnSpec]) -> Result<(), AppError>;
    async fn drop_table(&self, table: &str) -> Result<(), AppError>;

    // === Health and statistics ===
    async fn health_check(&self) -> Result<bool, AppError>;
    async fn connection_stats(&self) -> Result<ConnectionStats, AppError>;
}

/// Default `DbService` implementation over a shared connection pool.
pub struct DbServiceImpl {
    /// Connection manager
    connection: Arc<ConnectionManager>,

    /// Query executor
    executor: Arc<QueryExecutor>,

    /// Metadata provider
    metadata: Arc<MetadataProvider>,
}

impl DbServiceImpl {
    /// Builds the service from an initialized configuration.
    ///
    /// The pool handle is injected into every component here; nothing is
    /// resolved from ambient or global state.
    pub fn new(config: DbServiceConfig) -> Self {
        let connection = Arc::new(ConnectionManager::new(&config));

        let executor = Arc::new(QueryExecutor::new(
            (*connection).clone(),
            config.query_config.clone(),
        ));

        let metadata = Arc::new(MetadataProvider::new(QueryExecutor::new(
            (*connection).clone(),
            config.query_config.clone(),
        )));

        Self {
            connection,
            executor,
            metadata,
        }
    }

    /// Creates the service with environment-driven configuration.
    ///
    /// Performs the one-time pool handshake; a `Connection` error here is
    /// fatal and the process must not start serving.
    pub async fn from_env() -> Result<Self, AppError> {
        let config = DbServiceConfig::from_env().await?;
        Ok(Self::new(config))
    }

    /// Closes the underlying pool. Called exactly once on shutdown, on
    /// every exit path.
    pub async fn shutdown(&self) {
        self.connection.close().await;
    }
}

#[async_trait]
impl DbService for DbServiceImpl {
    // === Introspection ===

    async fn get_tables(&self) -> Result<Vec<String>, AppError> {
        self.metadata.get_tables().await
    }

    async fn get_table_schema(&self, table: &str) -> Result<Vec<ColumnSchema>, AppError> {
        self.metadata.get_table_schema(table).await
    }

    async fn table_exists(&self, table: &str) -> Result<bool, AppError> {
        self.metadata.table_exists(table).await
    }

    // === Query operations ===

    async fn execute_query(&self, sql: &str) -> Result<Vec<QueryRow>, AppError> {
        self.executor.fetch_rows(sql, &[]).await
    }

    async fn select_rows(
        &self,
        table: &str,
        options: SelectOptions,
    ) -> Result<Vec<QueryRow>, AppError> {
        let built = query::build_select(table, &options)?;
        self.executor.fetch_rows(&built.sql, &built.params).await
    }

    async fn insert_row(
        &self,
        table: &str,
        data: QueryParams,
    ) -> Result<Option<QueryRow>, AppError> {
        let built = query::build_insert(table, &data)?;
        let row = self
            .executor
            .fetch_optional_row(&built.sql, &built.params)
            .await?;

        info!("Inserted row into table '{}'", table);
        Ok(row)
    }

    async fn update_rows(
        &self,
        table: &str,
        data: QueryParams,
        condition: Condition,
    ) -> Result<UpdateOutcome, AppError> {
        let built = query::build_update(table, &data, &condition)?;
        let rows = self.executor.fetch_rows(&built.sql, &built.params).await?;

        info!("Updated {} rows in table '{}'", rows.len(), table);
        Ok(UpdateOutcome {
            rows_updated: rows.len() as u64,
            updated_data: rows,
        })
    }

    async fn delete_rows(
        &self,
        table: &str,
        condition: Condition,
    ) -> Result<DeleteOutcome, AppError> {
        let built = query::build_delete(table, &condition)?;
        let rows = self.executor.fetch_rows(&built.sql, &built.params).await?;

        info!("Deleted {} rows from table '{}'", rows.len(), table);
        Ok(DeleteOutcome {
            rows_deleted: rows.len() as u64,
            deleted_data: rows,
        })
    }

    // === DDL operations ===

    async fn create_table(&self, table: &str, columns: &[ColumnSpec]) -> Result<(), AppError> {
        let sql = query::build_create_table(table, columns);
        self.executor.execute(&sql, &[]).await?;

        info!("Created table: {}", table);
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<(), AppError> {
        let sql = query::build_drop_table(table);
        self.executor.execute(&sql, &[]).await?;

        info!("Dropped table: {}", table);
        Ok(())
    }

    // === Health and statistics ===

    async fn health_check(&self) -> Result<bool, AppError> {
        self.connection.health_check().await
    }

    async fn connection_stats(&self) -> Result<ConnectionStats, AppError> {
        Ok(self.connection.stats())
    }
}
