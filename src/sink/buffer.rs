//! Telemetry buffer client.
//!
//! Connects to the local telemetry relay over a Unix socket / named pipe and
//! writes one frame per report or metric. The relay owns batching and the
//! upload to the ingestion endpoint.
//!
//! The stream runs in non-blocking mode. A frame the relay does not drain
//! within the write timeout fails the write and drops the connection, so a
//! stalled relay never holds up senders.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use interprocess::local_socket::{prelude::*, GenericFilePath, Stream};
use parking_lot::Mutex;
use uuid::Uuid;

use super::protocol::{encode_frame, SinkEnvelope};
use super::{RemoteSink, SinkError};
use crate::connection_string::ConnectionParameters;
use crate::report::{Metric, ReportState};

/// Default relay socket path.
#[cfg(unix)]
pub const DEFAULT_RELAY_PATH: &str = "/var/run/telemetry-relay.sock";

#[cfg(windows)]
pub const DEFAULT_RELAY_PATH: &str = r"\\.\pipe\telemetry-relay";

/// Longest a single frame write may wait on a full relay socket.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

const WRITE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for [`TelemetryBuffer`].
#[derive(Debug, Clone)]
pub struct TelemetryBufferConfig {
    pub relay_path: String,
    /// Forwarded to the relay in the hello frame when present.
    pub connection: Option<ConnectionParameters>,
    /// Bound on each frame write; see [`DEFAULT_WRITE_TIMEOUT`].
    pub write_timeout: Duration,
}

impl Default for TelemetryBufferConfig {
    fn default() -> Self {
        Self {
            relay_path: DEFAULT_RELAY_PATH.to_string(),
            connection: None,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// [`RemoteSink`] backed by a local-socket connection to the relay.
pub struct TelemetryBuffer {
    config: TelemetryBufferConfig,
    session_id: Uuid,
    stream: Mutex<Option<Stream>>,
    connected: AtomicBool,
}

impl TelemetryBuffer {
    pub fn new(config: TelemetryBufferConfig) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4(),
            stream: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// Identifier announced to the relay on every connection.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn relay_path(&self) -> &str {
        &self.config.relay_path
    }

    fn hello(&self) -> SinkEnvelope {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();
        let connection = self.config.connection.as_ref();
        SinkEnvelope::Hello {
            session_id: self.session_id.to_string(),
            hostname,
            pid: std::process::id(),
            instrumentation_key: connection.map(|c| c.instrumentation_key().to_string()),
            ingestion_url: connection.map(|c| c.ingestion_url().to_string()),
        }
    }

    fn write_frame(&self, envelope: &SinkEnvelope) -> Result<(), SinkError> {
        let frame = encode_frame(envelope)?;
        let mut guard = self.stream.lock();
        let stream = guard.as_mut().ok_or(SinkError::NotConnected)?;
        if let Err(e) = write_bounded(stream, &frame, self.config.write_timeout) {
            // Relay gone or stalled; drop the stream so the next connect starts clean.
            *guard = None;
            self.connected.store(false, Ordering::SeqCst);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Write all of `frame` to a non-blocking stream, giving up once `timeout`
/// has passed without the relay draining it.
fn write_bounded(stream: &mut Stream, frame: &[u8], timeout: Duration) -> io::Result<()> {
    let deadline = Instant::now() + timeout;
    let mut written = 0;
    while written < frame.len() {
        match stream.write(&frame[written..]) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "telemetry relay stopped reading",
                    ));
                }
                std::thread::sleep(WRITE_POLL_INTERVAL);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

impl Default for TelemetryBuffer {
    fn default() -> Self {
        Self::new(TelemetryBufferConfig::default())
    }
}

impl RemoteSink for TelemetryBuffer {
    fn connect(&self) -> Result<(), SinkError> {
        if self.is_connected() {
            return Ok(());
        }

        let name = self
            .config
            .relay_path
            .as_str()
            .to_fs_name::<GenericFilePath>()
            .map_err(|e| SinkError::InvalidEndpoint(format!("{}: {}", self.config.relay_path, e)))?;
        let stream = Stream::connect(name)?;
        stream.set_nonblocking(true)?;
        *self.stream.lock() = Some(stream);
        self.connected.store(true, Ordering::SeqCst);

        if let Err(e) = self.write_frame(&self.hello()) {
            tracing::debug!(relay = %self.config.relay_path, error = %e, "relay rejected hello frame");
            return Err(e);
        }

        tracing::debug!(
            relay = %self.config.relay_path,
            session_id = %self.session_id,
            "connected to telemetry relay"
        );
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send_report(&self, report: &ReportState) -> Result<(), SinkError> {
        self.write_frame(&SinkEnvelope::report(report))
    }

    fn send_metric(&self, metric: &Metric) -> Result<(), SinkError> {
        self.write_frame(&SinkEnvelope::metric(metric))
    }

    /// Waits at most one write timeout for an in-flight frame.
    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        if self.stream.lock().take().is_some() {
            tracing::debug!(relay = %self.config.relay_path, "closed telemetry relay connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_relay() -> TelemetryBuffer {
        let dir = std::env::temp_dir().join(format!("no-relay-{}", Uuid::new_v4()));
        TelemetryBuffer::new(TelemetryBufferConfig {
            relay_path: dir.join("relay.sock").to_string_lossy().into_owned(),
            ..Default::default()
        })
    }

    #[test]
    fn test_default_relay_path() {
        let buffer = TelemetryBuffer::default();
        assert_eq!(buffer.relay_path(), DEFAULT_RELAY_PATH);
        assert_eq!(buffer.config.write_timeout, DEFAULT_WRITE_TIMEOUT);
        assert!(!buffer.is_connected());
    }

    #[test]
    fn test_connect_to_missing_relay_fails() {
        let buffer = missing_relay();
        assert!(buffer.connect().is_err());
        assert!(!buffer.is_connected());
    }

    #[test]
    fn test_send_while_disconnected() {
        let buffer = missing_relay();
        let err = buffer.send_report(&ReportState::default()).unwrap_err();
        assert!(matches!(err, SinkError::NotConnected));
    }

    #[test]
    fn test_close_is_idempotent() {
        let buffer = missing_relay();
        buffer.close();
        buffer.close();
        assert!(!buffer.is_connected());
    }

    #[test]
    fn test_hello_carries_connection_parameters() {
        let params = crate::connection_string::parse(
            "InstrumentationKey=K;IngestionEndpoint=https://h/",
        )
        .unwrap();
        let buffer = TelemetryBuffer::new(TelemetryBufferConfig {
            relay_path: DEFAULT_RELAY_PATH.into(),
            connection: Some(params),
            ..Default::default()
        });
        match buffer.hello() {
            SinkEnvelope::Hello {
                session_id,
                pid,
                instrumentation_key,
                ingestion_url,
                ..
            } => {
                assert_eq!(session_id, buffer.session_id().to_string());
                assert_eq!(pid, std::process::id());
                assert_eq!(instrumentation_key.as_deref(), Some("K"));
                assert_eq!(ingestion_url.as_deref(), Some("https://h/v2.1/track"));
            }
            other => panic!("expected hello, got {:?}", other),
        }
    }
}
