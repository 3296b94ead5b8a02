//! Error management
//!
//! Every failure the access layer can surface, collected into a single
//! application error type with severity-aware logging.

use thiserror::Error;
use tracing::{error, info, warn};

/// Application error definition
///
/// Request-level failures are returned to the caller; only `Connection`
/// during startup is fatal to the process.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// The database cannot be reached. Fatal when raised during pool
    /// initialization; the process must not start serving.
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Timed out waiting for a pooled connection. Callers may retry.
    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),

    /// A statement failed at the driver. The database message is attached
    /// verbatim and never interpreted or classified.
    #[error("Query execution failed: {0}")]
    Execution(String),

    /// Structurally invalid caller input, caught before execution.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed environment configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    /// Returns the severity of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Connection(_) | AppError::Configuration(_) => ErrorSeverity::Critical,
            AppError::Execution(_) => ErrorSeverity::High,
            AppError::PoolExhausted(_) | AppError::InvalidInput(_) => ErrorSeverity::Medium,
        }
    }

    /// Logs the error at a level matching its severity.
    pub fn log(&self, context: &str) {
        match self.severity() {
            ErrorSeverity::Critical => error!("[CRITICAL] {} - {}", context, self),
            ErrorSeverity::High => error!("[HIGH] {} - {}", context, self),
            ErrorSeverity::Medium => warn!("[MEDIUM] {} - {}", context, self),
            ErrorSeverity::Low => info!("[LOW] {} - {}", context, self),
        }
    }
}

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorSeverity {
    Critical, // process-level failure
    High,     // operation failed
    Medium,   // caller input or transient condition
    Low,      // informational
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                AppError::PoolExhausted("timed out waiting for a pooled connection".to_string())
            }
            sqlx::Error::PoolClosed => {
                AppError::Connection("connection pool is closed".to_string())
            }
            sqlx::Error::Io(io_err) => AppError::Connection(io_err.to_string()),
            sqlx::Error::Configuration(e) => AppError::Configuration(e.to_string()),
            sqlx::Error::Database(db_err) => AppError::Execution(db_err.to_string()),
            other => AppError::Execution(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_maps_to_pool_exhausted() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::PoolExhausted(_)));
    }

    #[test]
    fn pool_closed_maps_to_connection() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert!(matches!(err, AppError::Connection(_)));
    }

    #[test]
    fn connection_errors_are_critical() {
        assert_eq!(
            AppError::Connection("refused".to_string()).severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(
            AppError::PoolExhausted("timeout".to_string()).severity(),
            ErrorSeverity::Medium
        );
    }
}
