//! Core database components
//!
//! Modular components for database operations with clear separation of
//! concerns: configuration, connection pooling, query construction,
//! statement execution, and catalog metadata.

pub mod config;
pub mod connection;
pub mod executor;
pub mod metadata;
pub mod query;
pub mod types;

pub use config::DbServiceConfig;
pub use connection::ConnectionManager;
pub use executor::QueryExecutor;
pub use metadata::MetadataProvider;
pub use types::*;
