//! Telemetry client integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use telemetry_dispatch::client::Sleeper;
use telemetry_dispatch::{
    Metric, RemoteSink, ReportState, Severity, SinkError, StructuredLogger, TelemetryClient,
    TelemetryConfig,
};

#[derive(Default)]
struct RecordingSink {
    connected: AtomicBool,
    reports: Mutex<Vec<ReportState>>,
    metrics: Mutex<Vec<Metric>>,
}

impl RemoteSink for RecordingSink {
    fn connect(&self) -> Result<(), SinkError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send_report(&self, report: &ReportState) -> Result<(), SinkError> {
        self.reports.lock().push(report.clone());
        Ok(())
    }

    fn send_metric(&self, metric: &Metric) -> Result<(), SinkError> {
        self.metrics.lock().push(metric.clone());
        Ok(())
    }

    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct RecordingLogger {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl StructuredLogger for RecordingLogger {
    fn log(&self, severity: Severity, message: &str, _fields: &[(&str, &str)]) {
        self.lines.lock().push((severity, message.to_string()));
    }
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

fn connected_client() -> (Arc<RecordingSink>, TelemetryClient) {
    let sink = Arc::new(RecordingSink::default());
    let client = TelemetryClient::with_sleeper(sink.clone(), Arc::new(NoSleep));
    client.connect(Arc::new(RecordingLogger::default())).unwrap();
    (sink, client)
}

#[test]
fn event_message_has_pid_prefix() {
    let (sink, client) = connected_client();
    client.send_event("telemetry event");

    let re = Regex::new(r"^\[\d+\] telemetry event$").unwrap();
    assert!(re.is_match(&sink.reports.lock()[0].event_message));
}

#[test]
fn concurrent_events_are_never_torn() {
    let (sink, client) = connected_client();
    let client = Arc::new(client);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let client = client.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    client.send_event(&format!("thread-{}-event-{}", t, i));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let re = Regex::new(r"^\[\d+\] thread-\d+-event-\d+$").unwrap();
    let reports = sink.reports.lock();
    assert_eq!(reports.len(), 400);
    assert!(reports.iter().all(|r| re.is_match(&r.event_message)));
}

#[test]
fn metric_does_not_touch_event_message() {
    let (sink, client) = connected_client();
    client.settings().version = "v1.4.0".into();
    client.send_event("startup");
    client.send_metric("ip_pool_size", 42.0, HashMap::new());

    assert!(client.settings().event_message.ends_with("] startup"));
    let metrics = sink.metrics.lock();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].app_version, "v1.4.0");
    assert_eq!(metrics[0].value, 42.0);
}

#[test]
fn send_log_reaches_logger() {
    let sink = Arc::new(RecordingSink::default());
    let logger = Arc::new(RecordingLogger::default());
    let client = TelemetryClient::new(sink);
    client.connect(logger.clone()).unwrap();

    client.send_log("pool refreshed");
    let lines = logger.lines.lock();
    assert_eq!(lines.as_slice(), &[(Severity::Info, "Telemetry Event".to_string())]);
}

#[test]
fn empty_client_never_panics() {
    let client = TelemetryClient::new(Arc::new(RecordingSink::default()));
    client.send_event("");
    client.send_error("oops");
    client.send_error_opt(None);
    client.send_metric("m", f64::NAN, HashMap::new());
    client.send_log("");
    client.disconnect();
    assert!(!client.is_connected());
}

#[test]
fn from_config_rejects_bad_connection_string() {
    let config = TelemetryConfig {
        connection_string: Some("InstrumentationKey=;IngestionEndpoint=https://h/".into()),
        ..TelemetryConfig::default()
    };
    assert!(TelemetryClient::from_config(&config).is_err());
}

#[test]
fn from_config_without_relay_fails_to_connect() {
    let dir = tempfile::tempdir().unwrap();
    let config = TelemetryConfig {
        relay_path: dir.path().join("absent.sock").to_string_lossy().into_owned(),
        ..TelemetryConfig::default()
    };
    let client = TelemetryClient::from_config(&config).unwrap();
    let logger = Arc::new(RecordingLogger::default());

    assert!(client
        .connect_with_retry(logger.clone(), 2, Duration::from_millis(1))
        .is_err());
    assert!(!client.is_connected());

    client.send_event("dropped");
    client.send_log("kept");
    assert_eq!(logger.lines.lock().len(), 1);
}
