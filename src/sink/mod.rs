//! Remote sink capability.
//!
//! The client only ever talks to a [`RemoteSink`]; the relay transport behind
//! [`TelemetryBuffer`] is one implementation of it.

mod buffer;
pub mod protocol;

pub use buffer::{
    TelemetryBuffer, TelemetryBufferConfig, DEFAULT_RELAY_PATH, DEFAULT_WRITE_TIMEOUT,
};
pub use protocol::{decode_frame, encode_frame, SinkEnvelope, MAX_FRAME_SIZE};

use thiserror::Error;

use crate::report::{Metric, ReportState};

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not connected to telemetry relay")]
    NotConnected,

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Invalid relay endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Connect / send / close capability over a telemetry backend.
///
/// Implementations use interior mutability; every method takes `&self` so a
/// sink can be shared between concurrent senders.
pub trait RemoteSink: Send + Sync {
    /// Make one connection attempt.
    fn connect(&self) -> Result<(), SinkError>;

    fn is_connected(&self) -> bool;

    fn send_report(&self, report: &ReportState) -> Result<(), SinkError>;

    fn send_metric(&self, metric: &Metric) -> Result<(), SinkError>;

    /// Release the underlying transport. Safe to call repeatedly.
    fn close(&self);
}
