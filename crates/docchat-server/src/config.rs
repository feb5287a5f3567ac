//! HTTP server configuration

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use docchat_core::env::{parse_or, process_env, read, read_or};
use docchat_core::{Error, Result};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Requests allowed per client IP within one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(900),
            max_requests: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Allowed browser origin; `*` allows any
    pub cors_origin: String,
    pub rate_limit: RateLimitConfig,
    /// Directory for daily rolling log files, stdout only when unset
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(process_env)
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = read_or(&lookup, "HOST", DEFAULT_HOST);
        let host: IpAddr = host
            .parse()
            .map_err(|e| Error::Configuration(format!("Invalid HOST '{}': {}", host, e)))?;

        let defaults = RateLimitConfig::default();
        let window_secs: u64 =
            parse_or(&lookup, "RATE_LIMIT_WINDOW_SECS", defaults.window.as_secs())?;
        let max_requests: u32 =
            parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", defaults.max_requests)?;
        if window_secs == 0 || max_requests == 0 {
            return Err(Error::Configuration(
                "RATE_LIMIT_WINDOW_SECS and RATE_LIMIT_MAX_REQUESTS must be positive".to_string(),
            ));
        }

        Ok(Self {
            host,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            cors_origin: read_or(&lookup, "CORS_ORIGIN", DEFAULT_CORS_ORIGIN),
            rate_limit: RateLimitConfig {
                window: Duration::from_secs(window_secs),
                max_requests,
            },
            log_dir: read(&lookup, "LOG_DIR").map(PathBuf::from),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            rate_limit: RateLimitConfig::default(),
            log_dir: None,
        }
    }
}
