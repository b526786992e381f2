//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use parking_core::observability::LogFormat;
use parking_core::slots::DEFAULT_SLOT_COUNT;

/// Default HTTP port.
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable was present but could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidInput(String),
}

/// Configuration result type.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for the parking API server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Address the HTTP listener binds to.
    pub http_host: IpAddr,

    /// HTTP server port.
    pub http_port: u16,

    /// Number of parking slots, fixed for the life of the process.
    pub slot_count: u32,

    /// Enable debug mode.
    ///
    /// When enabled, logs are pretty-printed instead of JSON.
    pub debug: bool,

    /// Optional per-request timeout in seconds.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Optional limit on concurrently processed requests.
    #[serde(default)]
    pub concurrency_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: DEFAULT_HTTP_PORT,
            slot_count: DEFAULT_SLOT_COUNT,
            debug: false,
            request_timeout_secs: None,
            concurrency_limit: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Supported env vars:
    /// - `PARKING_HTTP_HOST` (default `0.0.0.0`)
    /// - `PARKING_HTTP_PORT` (default `8000`)
    /// - `PARKING_SLOT_COUNT` (default `3`, at least 1)
    /// - `PARKING_DEBUG`
    /// - `PARKING_REQUEST_TIMEOUT_SECS`
    /// - `PARKING_CONCURRENCY_LIMIT`
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env { lookup };
        let mut config = Self::default();

        if let Some(host) = env.string("PARKING_HTTP_HOST") {
            config.http_host = host.parse().map_err(|e| {
                ConfigError::InvalidInput(format!("PARKING_HTTP_HOST must be an IP address: {e}"))
            })?;
        }
        if let Some(port) = env.u16("PARKING_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(count) = env.u32("PARKING_SLOT_COUNT")? {
            if count == 0 {
                return Err(ConfigError::InvalidInput(
                    "PARKING_SLOT_COUNT must be greater than 0".to_string(),
                ));
            }
            config.slot_count = count;
        }
        if let Some(debug) = env.bool("PARKING_DEBUG")? {
            config.debug = debug;
        }
        if let Some(secs) = env.u64("PARKING_REQUEST_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ConfigError::InvalidInput(
                    "PARKING_REQUEST_TIMEOUT_SECS must be greater than 0".to_string(),
                ));
            }
            config.request_timeout_secs = Some(secs);
        }
        if let Some(limit) = env.usize("PARKING_CONCURRENCY_LIMIT")? {
            if limit == 0 {
                return Err(ConfigError::InvalidInput(
                    "PARKING_CONCURRENCY_LIMIT must be greater than 0".to_string(),
                ));
            }
            config.concurrency_limit = Some(limit);
        }

        Ok(config)
    }

    /// Returns the socket address the server binds to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http_host, self.http_port)
    }

    /// Returns the per-request timeout, if configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Returns the log format implied by `debug`.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        if self.debug {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn u16(&self, name: &str) -> Result<Option<u16>> {
        self.parsed(name, "a u16")
    }

    fn u32(&self, name: &str) -> Result<Option<u32>> {
        self.parsed(name, "a u32")
    }

    fn u64(&self, name: &str) -> Result<Option<u64>> {
        self.parsed(name, "a u64")
    }

    fn usize(&self, name: &str) -> Result<Option<usize>> {
        self.parsed(name, "a usize")
    }

    fn bool(&self, name: &str) -> Result<Option<bool>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        parse_bool(name, &v).map(Some)
    }

    fn parsed<T>(&self, name: &str, expected: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidInput(format!("{name} must be {expected}: {e}")))
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(ConfigError::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}
