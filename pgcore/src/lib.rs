//! PostgreSQL access layer
//!
//! Shared library behind the pgserver protocol adapter. Turns structured
//! operation requests into parameterized SQL plus a positional argument
//! vector, executes them against a pooled connection, and maps results back
//! into a uniform row representation.

pub mod config;
pub mod service;
pub mod tool;

// Re-export the key components for a clean public API
pub use service::db::{DbService, DbServiceImpl};
pub use tool::error::AppError;
