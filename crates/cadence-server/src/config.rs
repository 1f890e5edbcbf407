//! Server configuration
//!
//! Resolved in layers: built-in defaults, then `CADENCE_*` environment
//! variables, then command-line flags.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use cadence_core::{QualityPolicy, Storage};

use crate::logging::LogFormat;

/// Default bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port
pub const DEFAULT_PORT: u16 = 8000;

/// Database file name inside a custom data directory
pub const DB_FILE_NAME: &str = "cadence.db";

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid bind address {0}")]
    InvalidAddress(String),
}

/// Resolved server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `cadence.db`; `None` uses the platform data dir
    pub data_dir: Option<PathBuf>,
    pub quality_policy: QualityPolicy,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: None,
            quality_policy: QualityPolicy::default(),
            cors_origins: Vec::new(),
            log_format: LogFormat::default(),
        }
    }
}

/// Flags shared by `cadence-server` and `cadence serve`
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(long)]
    pub port: Option<u16>,

    /// Comma-separated list of allowed CORS origins (default: any)
    #[arg(long, value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl ServerConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("CADENCE_HOST") {
            config.host = host.trim().to_string();
        }
        if let Some(port) = get("CADENCE_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                    var: "CADENCE_PORT",
                    value: port.clone(),
                    reason: e.to_string(),
                })?;
        }
        if let Some(dir) = get("CADENCE_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(policy) = get("CADENCE_QUALITY_POLICY") {
            config.quality_policy =
                policy
                    .parse()
                    .map_err(|reason: String| ConfigError::InvalidValue {
                        var: "CADENCE_QUALITY_POLICY",
                        value: policy.clone(),
                        reason,
                    })?;
        }
        if let Some(origins) = get("CADENCE_CORS_ORIGINS") {
            config.cors_origins = split_list(&origins);
        }
        if let Some(format) = get("CADENCE_LOG_FORMAT") {
            config.log_format = LogFormat::parse(&format);
        }

        Ok(config)
    }

    /// Apply command-line overrides on top of the environment
    pub fn apply_args(&mut self, args: &ServeArgs) {
        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(origins) = &args.cors_origins {
            self.cors_origins = origins
                .iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty() && o != "*")
                .collect();
        }
        if args.json_logs {
            self.log_format = LogFormat::Json;
        }
    }

    /// Database file path, or `None` for the platform default
    pub fn db_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(DB_FILE_NAME))
    }

    /// Socket address to listen on
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }

    /// Open storage with this configuration's path and quality policy
    pub fn open_storage(&self) -> cadence_core::Result<Storage> {
        Ok(Storage::new(self.db_path())?.with_quality_policy(self.quality_policy))
    }
}

/// Split a comma-separated list; `*` alone means "any" and yields an empty list
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "*")
        .map(String::from)
        .collect()
}
