//! Connection pool management
//!
//! Owns the shared pool, hands out connections for the duration of a single
//! call, and tracks acquisition statistics.

use crate::service::db::core::config::DbServiceConfig;
use crate::service::db::core::types::ConnectionStats;
use crate::tool::error::AppError;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Connection manager for database operations
#[derive(Clone)]
pub struct ConnectionManager {
    /// Connection pool
    pool: Arc<PgPool>,

    /// Connection statistics
    stats: Arc<ConnectionStatistics>,

    /// Pool size ceiling, kept for statistics reporting
    max_connections: u32,
}

/// Internal statistics tracker
struct ConnectionStatistics {
    active_connections: AtomicU32,
    connection_errors: AtomicU64,
    total_queries: AtomicU64,
}

impl ConnectionManager {
    /// Creates a new connection manager over an initialized pool.
    pub fn new(config: &DbServiceConfig) -> Self {
        Self {
            pool: Arc::new(config.db_config.get_pool().clone()),
            max_connections: config.pool_config.max_connections,
            stats: Arc::new(ConnectionStatistics {
                active_connections: AtomicU32::new(0),
                connection_errors: AtomicU64::new(0),
                total_queries: AtomicU64::new(0),
            }),
        }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Acquires a connection, waiting up to the pool's acquire timeout.
    ///
    /// A timeout surfaces as `PoolExhausted`; the caller decides whether to
    /// retry. The connection itself returns to the pool on drop — callers
    /// must pair each acquire with exactly one `release` for the statistics
    /// to stay truthful.
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>, AppError> {
        match self.pool.acquire().await {
            Ok(conn) => {
                let active = self.stats.active_connections.fetch_add(1, Ordering::Relaxed) + 1;
                debug!("Connection acquired ({} active)", active);
                Ok(conn)
            }
            Err(sqlx::Error::PoolTimedOut) => {
                self.stats.connection_errors.fetch_add(1, Ordering::Relaxed);
                error!("Connection pool exhausted, acquisition timed out");
                Err(AppError::PoolExhausted(
                    "timed out waiting for a pooled connection".to_string(),
                ))
            }
            Err(e) => {
                self.stats.connection_errors.fetch_add(1, Ordering::Relaxed);
                error!("Failed to acquire connection: {}", e);
                Err(e.into())
            }
        }
    }

    /// Records that a previously acquired connection went back to the pool.
    pub fn release(&self) {
        self.stats.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Increments the query counter.
    pub fn record_query(&self) {
        self.stats.total_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Performs a liveness probe against the database.
    pub async fn health_check(&self) -> Result<bool, AppError> {
        match sqlx::query("SELECT 1").fetch_one(&*self.pool).await {
            Ok(_) => {
                debug!("Database health check passed");
                Ok(true)
            }
            Err(e) => {
                self.stats.connection_errors.fetch_add(1, Ordering::Relaxed);
                error!("Database health check failed: {}", e);
                Err(AppError::Connection(format!("health check failed: {}", e)))
            }
        }
    }

    /// Returns a snapshot of the pool statistics.
    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            active_connections: self.stats.active_connections.load(Ordering::Relaxed),
            idle_connections: self.pool.num_idle() as u32,
            max_connections: self.max_connections,
            connection_errors: self.stats.connection_errors.load(Ordering::Relaxed),
            total_queries: self.stats.total_queries.load(Ordering::Relaxed),
        }
    }

    /// Gracefully closes all connections.
    ///
    /// Runs on every shutdown path, including startup failure after the
    /// pool handshake succeeded.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}
