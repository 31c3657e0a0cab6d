//! Telemetry client.
//!
//! Owns the shared [`ReportState`], the relay connection lifecycle and the
//! fan-out to the remote sink and the structured logger. Every send method is
//! best-effort: it returns nothing, never panics and degrades to a no-op when
//! the relevant sink is not bound. Only `connect` and `connect_with_retry`
//! report failures.

mod retry;

pub use retry::{retry_fixed, Sleeper, ThreadSleeper, DEFAULT_CONNECT_ATTEMPTS, DEFAULT_CONNECT_WAIT};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::config::TelemetryConfig;
use crate::connection_string::ConnectionStringError;
use crate::report::{Metric, ReportState};
use crate::sink::{RemoteSink, SinkError, TelemetryBuffer};
use crate::telemetry::{metrics, StructuredLogger};

/// Message attached to every record written through [`TelemetryClient::send_log`].
pub const LOG_EVENT_MESSAGE: &str = "Telemetry Event";

/// Dispatches reports, metrics and log lines to the bound sinks.
pub struct TelemetryClient {
    report: Mutex<ReportState>,
    sink: Arc<dyn RemoteSink>,
    bound_sink: RwLock<Option<Arc<dyn RemoteSink>>>,
    logger: RwLock<Option<Arc<dyn StructuredLogger>>>,
    sleeper: Arc<dyn Sleeper>,
}

impl TelemetryClient {
    /// Create a client around `sink`. Nothing is bound until `connect`.
    pub fn new(sink: Arc<dyn RemoteSink>) -> Self {
        Self::with_sleeper(sink, Arc::new(ThreadSleeper))
    }

    pub fn with_sleeper(sink: Arc<dyn RemoteSink>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            report: Mutex::new(ReportState::default()),
            sink,
            bound_sink: RwLock::new(None),
            logger: RwLock::new(None),
            sleeper,
        }
    }

    /// Create a client talking to the relay described by `config`.
    pub fn from_config(config: &TelemetryConfig) -> Result<Self, ConnectionStringError> {
        let buffer = TelemetryBuffer::new(config.buffer_config()?);
        Ok(Self::new(Arc::new(buffer)))
    }

    /// Lock the report for in-place edits. Intended for setup; sends block
    /// while the guard is held.
    pub fn settings(&self) -> MutexGuard<'_, ReportState> {
        self.report.lock()
    }

    /// Replace the whole report. Startup only.
    pub fn replace_settings(&self, report: ReportState) {
        *self.report.lock() = report;
    }

    /// True when a sink is bound and its transport reports connected.
    pub fn is_connected(&self) -> bool {
        self.bound_sink
            .read()
            .as_ref()
            .map_or(false, |sink| sink.is_connected())
    }

    /// Bind `logger` and the sink, then make a single connection attempt.
    ///
    /// The logger stays bound when the attempt fails, so logging keeps
    /// working while remote telemetry is down.
    pub fn connect(&self, logger: Arc<dyn StructuredLogger>) -> Result<(), SinkError> {
        self.bind(logger);
        metrics::record_connect_attempt();
        self.sink.connect()
    }

    /// Like [`connect`](Self::connect) but retries up to `max_attempts` times,
    /// waiting `wait` between attempts. Blocks for at most
    /// `(max_attempts - 1) * wait` plus the attempts themselves; there is no
    /// way to cancel early.
    pub fn connect_with_retry(
        &self,
        logger: Arc<dyn StructuredLogger>,
        max_attempts: u32,
        wait: Duration,
    ) -> Result<(), SinkError> {
        self.bind(logger);
        let result = retry_fixed(max_attempts, wait, self.sleeper.as_ref(), |attempt| {
            metrics::record_connect_attempt();
            self.sink.connect().map_err(|e| {
                tracing::debug!(attempt, max_attempts, error = %e, "telemetry relay connect failed");
                e
            })
        });
        if let Err(e) = &result {
            tracing::warn!(error = %e, max_attempts, "giving up on telemetry relay");
        }
        result
    }

    fn bind(&self, logger: Arc<dyn StructuredLogger>) {
        *self.logger.write() = Some(logger);
        *self.bound_sink.write() = Some(self.sink.clone());
    }

    /// Close and release the sink. No-op if never connected.
    pub fn disconnect(&self) {
        if let Some(sink) = self.bound_sink.write().take() {
            sink.close();
        }
    }

    fn bound_sink(&self) -> Option<Arc<dyn RemoteSink>> {
        self.bound_sink.read().clone()
    }

    fn bound_logger(&self) -> Option<Arc<dyn StructuredLogger>> {
        self.logger.read().clone()
    }

    /// Send `message` as the report's event message, prefixed with the pid.
    ///
    /// The report lock is held across the update and the send, so concurrent
    /// callers never observe or ship a torn report.
    pub fn send_event(&self, message: &str) {
        let Some(sink) = self.bound_sink() else {
            return;
        };

        let mut report = self.report.lock();
        report.event_message = format!("[{}] {}", std::process::id(), message);
        match sink.send_report(&report) {
            Ok(()) => metrics::record_event_sent(),
            Err(e) => {
                metrics::record_send_failure("event");
                tracing::debug!(error = %e, "dropped telemetry report");
            }
        }
    }

    /// Send an error's text through the event path.
    ///
    /// The relay shows whichever of event/error message is set, so the error
    /// message field is left alone.
    pub fn send_error<E>(&self, err: &E)
    where
        E: fmt::Display + ?Sized,
    {
        self.send_event(&err.to_string());
    }

    /// [`send_error`](Self::send_error) that ignores `None`.
    pub fn send_error_opt(&self, err: Option<&dyn std::error::Error>) {
        if let Some(err) = err {
            self.send_error(err);
        }
    }

    /// Send a metric tagged with the report's current version. Failures are
    /// written to the bound logger instead of being returned.
    pub fn send_metric(&self, name: &str, value: f64, custom_dimensions: HashMap<String, String>) {
        let Some(sink) = self.bound_sink() else {
            return;
        };

        let metric = Metric {
            name: name.to_string(),
            value,
            app_version: self.report.lock().version.clone(),
            custom_dimensions,
        };
        if let Err(e) = sink.send_metric(&metric) {
            metrics::record_send_failure("metric");
            if let Some(logger) = self.bound_logger() {
                let text = format!("Couldn't send metric: {}", e);
                logger.warn(LOG_EVENT_MESSAGE, &[("message", text.as_str())]);
            }
        }
    }

    /// Write an informational record to the bound logger.
    pub fn send_log(&self, message: &str) {
        if let Some(logger) = self.bound_logger() {
            logger.info(LOG_EVENT_MESSAGE, &[("message", message)]);
        }
    }
}

impl fmt::Debug for TelemetryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryClient")
            .field("connected", &self.is_connected())
            .field("logger_bound", &self.logger.read().is_some())
            .finish()
    }
}
