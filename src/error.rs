//! Crate-level error type.
//!
//! Each module keeps its own error enum; this one exists for callers that
//! drive several of them (config load, logging setup, connect) with `?`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::connection_string::ConnectionStringError;
use crate::event_writer::EventWriterError;
use crate::sink::SinkError;
use crate::telemetry::LogError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    ConnectionString(#[from] ConnectionStringError),

    #[error("Telemetry sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Event writer error: {0}")]
    EventWriter(#[from] EventWriterError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
