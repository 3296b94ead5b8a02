//! pgserver - PostgreSQL access server
//!
//! Thin protocol adapter over the pgcore database service: accepts
//! length-prefixed JSON requests over TCP and maps each one onto a single
//! database operation.

use anyhow::{Context, Result};
use pgcore::service::db::DbServiceImpl;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

mod config;
mod handler;
mod protocol;

use config::{validate_config, ServerConfig};
use handler::RequestHandler;

/// Server entry point
///
/// Environment variables:
/// - `PGSERVER_HOST`: listen host (default: "127.0.0.1")
/// - `PGSERVER_PORT`: listen port (default: "5444")
/// - `POSTGRES_HOST` / `POSTGRES_PORT` / `POSTGRES_DB` / `POSTGRES_USER` /
///   `POSTGRES_PASSWORD`: database connection settings
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env()?;
    validate_config(&config)?;

    info!("=== pgserver configuration ===");
    info!("Listen address: {}", config.bind_address());
    info!("==============================");

    // The one-time pool handshake. Failure here is fatal: without a
    // reachable database the process must not start serving.
    let service = Arc::new(
        DbServiceImpl::from_env()
            .await
            .context("failed to initialize the database connection pool")?,
    );

    let result = run_server(&config, service.clone()).await;

    // Pool teardown runs on every exit path past initialization, including
    // a failed listener bind.
    service.shutdown().await;

    result
}

/// Accepts client connections until a shutdown signal arrives.
async fn run_server(config: &ServerConfig, service: Arc<DbServiceImpl>) -> Result<()> {
    let listener = TcpListener::bind(config.bind_address())
        .await
        .context("failed to bind TCP listener")?;

    info!("pgserver listening on {}", config.bind_address());

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        info!("New client connection: {}", addr);
                        let handler = RequestHandler::new(service.clone());

                        tokio::spawn(async move {
                            if let Err(e) = handler.handle_connection(stream, addr.to_string()).await {
                                error!("Client connection error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept client connection: {}", e);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping server");
                break;
            }
        }
    }

    Ok(())
}
