use std::env;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::store::StoreConfig;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_PATH: &str = "inventario.db";
pub const DEFAULT_STATIC_DIR: &str = "public";

const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:5173",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid HOST value {value:?}: {source}")]
    InvalidHost {
        value: String,
        #[source]
        source: AddrParseError,
    },
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub store: StoreConfig,
    pub static_dir: PathBuf,
    pub allowed_origins: Vec<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or unparsable numbers fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host_raw = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let host = host_raw
            .parse::<IpAddr>()
            .map_err(|source| ConfigError::InvalidHost { value: host_raw.clone(), source })?;
        let port = lookup("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let path = lookup("INVENTORY_DB_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let max_connections = lookup("INVENTORY_DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1);
        let static_dir = lookup("INVENTORY_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));
        let allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect());

        Ok(ServiceConfig {
            host,
            port,
            store: StoreConfig { path, max_connections },
            static_dir,
            allowed_origins,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
