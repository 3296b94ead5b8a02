//! Database service configuration
//!
//! Pool sizing and query execution settings, assembled around the
//! environment-driven connection configuration.

use crate::config::db::DbConfig;
use crate::tool::error::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Database service configuration
#[derive(Debug, Clone)]
pub struct DbServiceConfig {
    /// Connection settings and the initialized pool
    pub db_config: DbConfig,

    /// Connection pool settings
    pub pool_config: PoolConfig,

    /// Query execution settings
    pub query_config: QueryConfig,
}

/// Connection pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Minimum connections kept alive in the pool
    pub min_connections: u32,

    /// Upper bound on simultaneously open connections
    pub max_connections: u32,

    /// How long one operation may wait for a pooled connection
    pub acquire_timeout: Duration,
}

/// Query execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Log every statement at debug level
    pub enable_query_logging: bool,

    /// Threshold for slow query warnings (ms)
    pub slow_query_threshold_ms: u64,
}

impl DbServiceConfig {
    /// Creates a configuration from the environment with default tuning.
    ///
    /// This performs the one-time pool handshake; a failure here is fatal
    /// to startup and must be propagated, not retried.
    pub async fn from_env() -> Result<Self, AppError> {
        Self::with_configs(PoolConfig::default(), QueryConfig::default()).await
    }

    /// Creates a configuration with explicit pool and query tuning.
    pub async fn with_configs(
        pool_config: PoolConfig,
        query_config: QueryConfig,
    ) -> Result<Self, AppError> {
        let db_config = DbConfig::with_pool_config(&pool_config).await?;
        Ok(Self {
            db_config,
            pool_config,
            query_config,
        })
    }

    /// Wraps an already-connected configuration, for callers that built the
    /// pool themselves (tests, embedding applications).
    pub fn new(db_config: DbConfig) -> Self {
        Self {
            db_config,
            pool_config: PoolConfig::default(),
            query_config: QueryConfig::default(),
        }
    }

    /// Builder method for query configuration
    pub fn with_query_config(mut self, config: QueryConfig) -> Self {
        self.query_config = config;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 0,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            enable_query_logging: true,
            slow_query_threshold_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_defaults_are_bounded() {
        let config = PoolConfig::default();
        assert!(config.max_connections > 0);
        assert!(config.acquire_timeout > Duration::ZERO);
    }
}
