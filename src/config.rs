//! Dispatch configuration from environment variables or a TOML file.
//!
//! Environment values fall back to defaults when missing or invalid, without
//! panicking.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `TELEMETRY_CONNECTION_STRING` | unset | `InstrumentationKey=..;IngestionEndpoint=..` |
//! | `TELEMETRY_RELAY_PATH` | platform socket | Relay Unix socket / named pipe |
//! | `TELEMETRY_CONNECT_ATTEMPTS` | 5 | Relay connection attempts (min 1) |
//! | `TELEMETRY_CONNECT_WAIT_MS` | 200 | Delay between attempts (ms) |
//! | `TELEMETRY_LOG_LEVEL` | info | Log filter directive |
//! | `TELEMETRY_EVENT_NAME` | unset | Enables the event-writer tee |
//! | `TELEMETRY_EVENT_LEVEL` | info | Event-writer threshold |
//! | `TELEMETRY_EVENT_PROVIDER` | ACN-Data-Plane | Event provider name |

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::client::{DEFAULT_CONNECT_ATTEMPTS, DEFAULT_CONNECT_WAIT};
use crate::connection_string::{self, ConnectionParameters, ConnectionStringError};
use crate::event_writer::DEFAULT_PROVIDER_NAME;
use crate::severity::Severity;
use crate::sink::{TelemetryBufferConfig, DEFAULT_RELAY_PATH};
use crate::telemetry::{EventWriterConfig, LogConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid connection string: {0}")]
    Connection(#[from] ConnectionStringError),
}

/// All dispatch configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub connection_string: Option<String>,
    pub relay_path: String,
    pub connect_attempts: u32,
    pub connect_wait_ms: u64,
    pub log: LogConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            relay_path: DEFAULT_RELAY_PATH.to_string(),
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            connect_wait_ms: DEFAULT_CONNECT_WAIT.as_millis() as u64,
            log: LogConfig::default(),
        }
    }
}

impl TelemetryConfig {
    pub fn connect_wait(&self) -> Duration {
        Duration::from_millis(self.connect_wait_ms)
    }

    /// Parsed connection string, if one is configured.
    pub fn connection_parameters(&self) -> Result<Option<ConnectionParameters>, ConnectionStringError> {
        self.connection_string
            .as_deref()
            .map(connection_string::parse)
            .transpose()
    }

    pub fn buffer_config(&self) -> Result<TelemetryBufferConfig, ConnectionStringError> {
        Ok(TelemetryBufferConfig {
            relay_path: self.relay_path.clone(),
            connection: self.connection_parameters()?,
            ..TelemetryBufferConfig::default()
        })
    }

    fn normalize(mut self) -> Self {
        self.connect_attempts = self.connect_attempts.max(1);
        self
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn load_event_writer_config() -> Option<EventWriterConfig> {
    let event_name = non_empty_var("TELEMETRY_EVENT_NAME")?;
    Some(EventWriterConfig {
        event_name,
        level: parse_or("TELEMETRY_EVENT_LEVEL", Severity::Info),
        provider_name: non_empty_var("TELEMETRY_EVENT_PROVIDER")
            .unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_string()),
    })
}

/// Load configuration from environment variables.
pub fn load() -> TelemetryConfig {
    let defaults = TelemetryConfig::default();
    let log = LogConfig {
        level: non_empty_var("TELEMETRY_LOG_LEVEL").unwrap_or(defaults.log.level),
        event_writer: load_event_writer_config(),
        ..LogConfig::default()
    };

    TelemetryConfig {
        connection_string: non_empty_var("TELEMETRY_CONNECTION_STRING"),
        relay_path: non_empty_var("TELEMETRY_RELAY_PATH").unwrap_or(defaults.relay_path),
        connect_attempts: parse_or("TELEMETRY_CONNECT_ATTEMPTS", defaults.connect_attempts),
        connect_wait_ms: parse_or("TELEMETRY_CONNECT_WAIT_MS", defaults.connect_wait_ms),
        log,
    }
    .normalize()
}

/// Parse configuration from TOML text. Missing keys take their defaults.
pub fn from_toml_str(text: &str) -> Result<TelemetryConfig, ConfigError> {
    let config: TelemetryConfig = toml::from_str(text)?;
    // Surface a bad connection string at load time rather than at connect.
    config.connection_parameters()?;
    Ok(config.normalize())
}

pub fn from_file(path: impl AsRef<Path>) -> Result<TelemetryConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    from_toml_str(&text)
}
