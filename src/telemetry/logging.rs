//! Logging configuration and initialization.
//!
//! Supports JSON and pretty-printed formats with configurable output paths.
//! When an event writer is configured, every record at or above its threshold
//! is also teed into the platform event-tracing provider.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::fmt::format::{Format, Json, JsonFields};
use tracing_subscriber::fmt::writer::{MakeWriterExt, WithMaxLevel};
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::event_writer::{EventWriterError, EventWriterHandle, DEFAULT_PROVIDER_NAME};
use crate::severity::Severity;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON structured logging (default for production).
    #[default]
    Json,
    /// Human-readable pretty printing (for development).
    Pretty,
}

/// Platform event writer settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventWriterConfig {
    pub event_name: String,
    /// Records below this severity are not teed.
    #[serde(default = "default_event_level")]
    pub level: Severity,
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
}

fn default_event_level() -> Severity {
    Severity::Info
}

fn default_provider_name() -> String {
    DEFAULT_PROVIDER_NAME.to_string()
}

impl EventWriterConfig {
    pub fn new(event_name: impl Into<String>, level: Severity) -> Self {
        Self {
            event_name: event_name.into(),
            level,
            provider_name: default_provider_name(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Output format (JSON or Pretty).
    pub format: LogFormat,
    /// Log level filter (e.g., "info", "debug", "telemetry_dispatch=trace").
    pub level: String,
    /// Optional file path for log output. If None, logs to stdout.
    pub output_path: Option<PathBuf>,
    /// Optional tee into the platform event writer.
    pub event_writer: Option<EventWriterConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
            output_path: None,
            event_writer: None,
        }
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Failed to open log file: {0}")]
    FileOpen(String),
    #[error("Subscriber already initialized")]
    AlreadyInitialized,
}

/// Layer that formats records as JSON into the platform event writer.
pub type EventWriterLayer<S> =
    fmt::Layer<S, JsonFields, Format<Json>, WithMaxLevel<EventWriterHandle>>;

type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync + 'static>;

/// Build the event-writer tee layer.
///
/// Fails when the provider cannot be registered (always, on platforms without
/// event tracing); callers keep their base layers and carry on.
pub fn event_writer_layer<S>(config: &EventWriterConfig) -> Result<EventWriterLayer<S>, EventWriterError> {
    let handle = EventWriterHandle::with_provider(&config.provider_name, &config.event_name, config.level)?;
    Ok(tee_layer(handle, config.level))
}

/// Wrap an existing handle as a tee layer filtered at `threshold`.
pub fn tee_layer<S>(handle: EventWriterHandle, threshold: Severity) -> EventWriterLayer<S> {
    fmt::layer()
        .json()
        .with_writer(handle.with_max_level(threshold.to_tracing()))
}

/// Initialize the tracing subscriber with the given configuration.
///
/// This should be called once at application startup. An unavailable event
/// writer is not an error: logging falls back to the base sink and a warning
/// is emitted once the subscriber is up.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LogError::InvalidFilter(e.to_string()))?;

    let mut layers: Vec<BoxedLayer> = vec![base_layer(config)?];
    let mut fallback = None;
    if let Some(event_config) = &config.event_writer {
        match event_writer_layer(event_config) {
            Ok(layer) => layers.push(layer.boxed()),
            Err(e) => fallback = Some(e),
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)?;

    if let Some(e) = fallback {
        tracing::warn!(error = %e, "event writer unavailable, logging to base sink only");
    }
    Ok(())
}

fn base_layer(config: &LogConfig) -> Result<BoxedLayer, LogError> {
    match (config.format, &config.output_path) {
        (LogFormat::Json, Some(path)) => {
            let file = std::fs::File::create(path)
                .map_err(|e| LogError::FileOpen(e.to_string()))?;
            Ok(fmt::layer()
                .json()
                .with_writer(std::sync::Mutex::new(file))
                .boxed())
        }
        (LogFormat::Json, None) => Ok(fmt::layer().json().boxed()),
        (LogFormat::Pretty, _) => Ok(fmt::layer().pretty().boxed()),
    }
}
