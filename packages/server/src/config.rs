//! Server configuration
//!
//! Built once at startup from environment variables and passed to
//! `start_server`. Not reloaded while the process runs.
//!
//! | Variable            | Default               |
//! |---------------------|-----------------------|
//! | `BOARDS_PORT`       | `3001`                |
//! | `BOARDS_BIND_ADDR`  | `127.0.0.1`           |
//! | `BOARDS_DB_PATH`    | `./data/boards.db`    |
//! | `CORS_ALLOW_ORIGIN` | localhost dev origins |

use axum::http::HeaderValue;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DB_PATH: &str = "./data/boards.db";

/// Origins allowed when `CORS_ALLOW_ORIGIN` is not set
const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5173", // Vite default
    "http://localhost:1420",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid BOARDS_PORT '{0}': expected a port number")]
    InvalidPort(String),

    #[error("Invalid BOARDS_BIND_ADDR '{0}': expected an IP address")]
    InvalidBindAddr(String),

    #[error("Invalid CORS_ALLOW_ORIGIN '{0}': must be a valid HTTP origin")]
    InvalidCorsOrigin(String),
}

/// Runtime configuration of the board server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub db_path: PathBuf,
    pub cors_origins: Vec<HeaderValue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            cors_origins: DEFAULT_CORS_ORIGINS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = lookup("BOARDS_PORT") {
            config.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }

        if let Some(addr) = lookup("BOARDS_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(addr.clone()))?;
        }

        if let Some(path) = lookup("BOARDS_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(origin) = lookup("CORS_ALLOW_ORIGIN") {
            let origin = origin
                .parse::<HeaderValue>()
                .map_err(|_| ConfigError::InvalidCorsOrigin(origin.clone()))?;
            config.cors_origins = vec![origin];
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
