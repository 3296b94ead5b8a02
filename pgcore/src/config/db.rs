//! PostgreSQL database configuration
//!
//! Reads connection settings from the environment (with `.env` support) and
//! builds the shared connection pool used by every operation.

use crate::service::db::core::config::PoolConfig;
use crate::tool::error::AppError;
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use tracing::{info, warn};

/// PostgreSQL connection pool type alias
pub type DbConnection = PgPool;

/// PostgreSQL connection settings plus the initialized pool.
///
/// The pool is created exactly once at startup; a failed handshake is
/// propagated as `AppError::Connection` and never retried here.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub pool: DbConnection,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: String,
}

impl DbConfig {
    /// Creates a new connection pool from environment variables.
    ///
    /// Reads `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_DB`,
    /// `POSTGRES_USER`, and `POSTGRES_PASSWORD`, falling back to defaults
    /// when unset.
    pub async fn new() -> Result<Self, AppError> {
        Self::with_pool_config(&PoolConfig::default()).await
    }

    /// Creates a new connection pool with explicit pool sizing.
    pub async fn with_pool_config(pool_config: &PoolConfig) -> Result<Self, AppError> {
        dotenv().ok();

        let host = env::var("POSTGRES_HOST").unwrap_or_else(|_| {
            warn!("POSTGRES_HOST is not set, using localhost");
            "localhost".to_string()
        });

        let port = env::var("POSTGRES_PORT")
            .unwrap_or_else(|_| "5432".to_string())
            .parse::<u16>()
            .map_err(|e| AppError::Configuration(format!("POSTGRES_PORT must be a port number: {e}")))?;

        let user = env::var("POSTGRES_USER").unwrap_or_else(|_| {
            warn!("POSTGRES_USER is not set, using postgres");
            "postgres".to_string()
        });

        let password = env::var("POSTGRES_PASSWORD").unwrap_or_else(|_| {
            warn!("POSTGRES_PASSWORD is not set, using an empty password");
            String::new()
        });

        let database = env::var("POSTGRES_DB").unwrap_or_else(|_| {
            warn!("POSTGRES_DB is not set, using postgres");
            "postgres".to_string()
        });

        let database_url = format!("postgres://{user}:{password}@{host}:{port}/{database}");

        info!("Connecting to PostgreSQL: {}:{}@{}:{}/{}", user, "***", host, port, database);

        let pool = PgPoolOptions::new()
            .min_connections(pool_config.min_connections)
            .max_connections(pool_config.max_connections)
            .acquire_timeout(pool_config.acquire_timeout)
            .connect(&database_url)
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;

        info!("PostgreSQL connection pool ready: {}:{}/{}", host, port, database);

        Ok(Self {
            pool,
            host,
            port,
            user,
            database,
        })
    }

    /// Returns a reference to the connection pool.
    pub fn get_pool(&self) -> &DbConnection {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_port_is_a_configuration_error() {
        // The port is parsed before any connection attempt, so this fails
        // fast without a database.
        env::set_var("POSTGRES_PORT", "not-a-port");
        let result = DbConfig::new().await;
        env::remove_var("POSTGRES_PORT");

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
