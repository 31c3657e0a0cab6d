//! Structured logger capability bound into the telemetry client.

use crate::severity::Severity;

/// Tracing target used for records written through [`TracingLogger`].
pub const LOG_TARGET: &str = "telemetry";

/// Leveled logging with key/value fields.
pub trait StructuredLogger: Send + Sync {
    fn log(&self, severity: Severity, message: &str, fields: &[(&str, &str)]);

    fn info(&self, message: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Info, message, fields);
    }

    fn warn(&self, message: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Warning, message, fields);
    }
}

/// [`StructuredLogger`] that emits `tracing` events tagged with the process id.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    pid: u32,
}

impl TracingLogger {
    pub fn new() -> Self {
        Self {
            pid: std::process::id(),
        }
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn format_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

impl StructuredLogger for TracingLogger {
    fn log(&self, severity: Severity, message: &str, fields: &[(&str, &str)]) {
        let fields = format_fields(fields);
        let pid = self.pid;
        match severity {
            Severity::Debug => tracing::debug!(target: LOG_TARGET, pid, fields = %fields, "{}", message),
            Severity::Info => tracing::info!(target: LOG_TARGET, pid, fields = %fields, "{}", message),
            Severity::Warning => tracing::warn!(target: LOG_TARGET, pid, fields = %fields, "{}", message),
            Severity::Error => tracing::error!(target: LOG_TARGET, pid, fields = %fields, "{}", message),
            Severity::Critical => {
                tracing::error!(target: LOG_TARGET, pid, fields = %fields, critical = true, "{}", message)
            }
        }
    }
}
