//! Database service module
//!
//! Everything needed to serve the high-level PostgreSQL operations: the
//! core components (configuration, pooling, query construction, execution,
//! metadata) and the facade that composes them.

// Core modules with a clear separation of concerns
pub mod core;
pub mod facade;

// === Facade exports ===
pub use facade::{DbService, DbServiceImpl};

// === Core component exports ===
pub use self::core::{
    // Configuration
    config::{DbServiceConfig, PoolConfig, QueryConfig},
    // Connection management
    connection::ConnectionManager,
    // Query execution
    executor::QueryExecutor,
    // Metadata
    metadata::MetadataProvider,
    // Query construction
    query,
    // Data types
    types::{
        BuiltQuery, ColumnSchema, ColumnSpec, Condition, ConnectionStats, DeleteOutcome,
        QueryParams, QueryRow, SelectOptions, UpdateOutcome, DEFAULT_ROW_LIMIT,
    },
};
