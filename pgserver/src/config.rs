//! Server environment configuration
//!
//! Loads the listen address from `.env` files and the process environment.

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

/// TCP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen host address
    pub host: String,
    /// Listen port
    pub port: u16,
}

impl ServerConfig {
    /// Loads settings from the environment.
    ///
    /// Load order: `.env` files (current directory, then parents), system
    /// environment variables, built-in defaults.
    pub fn from_env() -> Result<Self> {
        Self::load_env_file();

        let config = Self {
            host: std::env::var("PGSERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PGSERVER_PORT")
                .unwrap_or_else(|_| "5444".to_string())
                .parse()
                .unwrap_or(5444),
        };

        info!("Server configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Returns the TCP bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tries to load a `.env` file from the usual locations.
    fn load_env_file() {
        let env_paths = [".env", "../.env"];

        let mut loaded = false;
        for path in env_paths {
            if Path::new(path).exists() && dotenv::from_filename(path).is_ok() {
                info!(".env file loaded: {}", path);
                loaded = true;
                break;
            }
        }

        if !loaded {
            warn!("No .env file found, using system environment variables");
        }
    }
}

/// Configuration validation
pub fn validate_config(config: &ServerConfig) -> Result<()> {
    if config.port == 0 {
        anyhow::bail!("invalid server port: {}", config.port);
    }

    if config.host.is_empty() {
        anyhow::bail!("server host address is empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_port_is_rejected() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn empty_host_is_rejected() {
        let config = ServerConfig {
            host: String::new(),
            port: 5444,
        };
        assert!(validate_config(&config).is_err());
    }
}
