//! Configuration management
//!
//! Built-in defaults, overridden by an optional `tcpft.toml` in the working
//! directory, overridden by `TCPFT_*` environment variables
//! (e.g. `TCPFT_PORT=9000`, `TCPFT_LOG_LEVEL=debug`).

use config::{Config, Environment, File};
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ServerError;
use crate::listing::ListingSource;
use crate::transfer::DEFAULT_BUFFER_SIZE;
use crate::utils::logging::LogConfig;

pub const DEFAULT_PORT: u16 = 8080;
const CONFIG_FILE: &str = "tcpft";
const ENV_PREFIX: &str = "TCPFT";

/// Parses one of the four levels the server logs at, ignoring case.
pub fn parse_log_level(level: &str) -> Option<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        _ => None,
    }
}

/// Server configuration, loaded once at startup
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address to listen on
    pub bind_address: String,

    pub port: u16,

    /// Largest chunk moved per read or write
    pub buffer_size: usize,

    /// Directory that uploads land in, downloads come from, and LIST enumerates
    pub server_root: String,

    /// Shell command used for LIST instead of the built-in directory reader
    pub list_command: Option<String>,

    /// One of debug, info, warn, error
    pub log_level: String,
    pub log_color: bool,

    /// Mirror log lines to this file (appended, line-buffered)
    pub log_file: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            server_root: ".".to_string(),
            list_command: None,
            log_level: "info".to_string(),
            log_color: true,
            log_file: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `tcpft.toml` (if present) with environment overrides
    pub fn load() -> Result<Self, ServerError> {
        Self::build(File::with_name(CONFIG_FILE).required(false))
    }

    /// Load configuration from an explicit file with environment overrides
    pub fn load_from(path: &Path) -> Result<Self, ServerError> {
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ServerError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.buffer_size == 0 {
            return Err(config::ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        if self.server_root.is_empty() {
            return Err(config::ConfigError::Message(
                "server_root cannot be empty".into(),
            ));
        }

        if parse_log_level(&self.log_level).is_none() {
            return Err(config::ConfigError::Message(format!(
                "log_level {:?} is not one of debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Bind address and port as one socket address string
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }

    pub fn listing_source(&self) -> ListingSource {
        ListingSource::from_command(self.list_command.as_deref())
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: parse_log_level(&self.log_level).unwrap_or(LevelFilter::Info),
            color: self.log_color,
            file: self.log_file.as_ref().map(PathBuf::from),
        }
    }
}
