//! Telemetry dispatch layer
//!
//! Turns application events, metrics and errors into telemetry reports and
//! fans them out to a local relay and to the structured logger. A platform
//! event writer can tee log records into the OS event-tracing facility
//! (ETW on Windows; reported as unsupported elsewhere).
//!
//! # Components
//!
//! - [`connection_string`]: `InstrumentationKey=..;IngestionEndpoint=..` parser
//! - [`client`]: report state, connect-with-retry and best-effort sends
//! - [`sink`]: relay transport over a Unix socket / named pipe
//! - [`event_writer`]: platform event writer behind one trait
//! - [`telemetry`]: subscriber setup, structured logger, local counters
//!
//! # Failure model
//!
//! Configuration and connection errors are returned. Send-time errors never
//! reach the caller: sends are no-ops when nothing is bound, and metric
//! failures are written to the logger instead.

pub mod client;
pub mod config;
pub mod connection_string;
pub mod error;
pub mod event_writer;
pub mod report;
pub mod severity;
pub mod sink;
pub mod telemetry;

pub use client::TelemetryClient;
pub use config::{ConfigError, TelemetryConfig};
pub use connection_string::{ConnectionParameters, ConnectionStringError};
pub use error::{Error, Result};
pub use event_writer::{EventLevel, EventWriter, EventWriterError, EventWriterHandle};
pub use report::{Metric, ReportState};
pub use severity::Severity;
pub use sink::{RemoteSink, SinkError, TelemetryBuffer, TelemetryBufferConfig};
pub use telemetry::{init_logging, LogConfig, StructuredLogger, TracingLogger};
