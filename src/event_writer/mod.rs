//! Platform event writer.
//!
//! Emits log records as OS-native tracing events (ETW on Windows). Other
//! platforms get a variant that fails every operation with
//! [`EventWriterError::Unsupported`], so callers notice and fall back.

#[cfg(windows)]
mod windows;
#[cfg(not(windows))]
mod unsupported;

#[cfg(windows)]
pub use windows::EtwEventWriter;
#[cfg(not(windows))]
pub use unsupported::UnsupportedEventWriter;

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::fmt::MakeWriter;

use crate::severity::Severity;

/// Provider name used when none is configured.
pub const DEFAULT_PROVIDER_NAME: &str = "ACN-Data-Plane";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventWriterError {
    #[error("event tracing is not supported on this platform")]
    Unsupported,

    #[error("failed to register event provider {provider}: status {code}")]
    Registration { provider: String, code: u32 },

    #[error("failed to write event: status {0}")]
    Write(u32),
}

/// Native event levels understood by the tracing facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EventLevel {
    LogAlways = 0,
    Critical = 1,
    Error = 2,
    Warning = 3,
    Informational = 4,
    Verbose = 5,
}

impl EventLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<Severity> for EventLevel {
    /// The facility has no debug bucket, so debug lands in Verbose.
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Debug => Self::Verbose,
            Severity::Info => Self::Informational,
            Severity::Warning => Self::Warning,
            Severity::Error => Self::Error,
            Severity::Critical => Self::Critical,
        }
    }
}

/// Write / flush capability over a platform tracing provider.
pub trait EventWriter: Send + Sync {
    /// Emit one event carrying `payload` as its message field.
    fn write_event(&self, level: EventLevel, payload: &[u8]) -> Result<usize, EventWriterError>;

    /// Providers keep no user-space buffer; implementations succeed unless
    /// the platform is unsupported.
    fn flush(&self) -> Result<(), EventWriterError>;

    fn event_name(&self) -> &str;
}

/// Register a provider and return the platform's writer.
pub fn create_event_writer(
    provider_name: &str,
    event_name: &str,
) -> Result<Arc<dyn EventWriter>, EventWriterError> {
    #[cfg(windows)]
    {
        let writer = EtwEventWriter::register(provider_name, event_name)?;
        Ok(Arc::new(writer))
    }
    #[cfg(not(windows))]
    {
        let writer = UnsupportedEventWriter::register(provider_name, event_name)?;
        Ok(Arc::new(writer))
    }
}

/// Shared handle to a registered writer plus the level used for plain writes.
///
/// Implements [`io::Write`] and [`MakeWriter`] so it can sit under a
/// formatting layer like any other log destination.
#[derive(Clone)]
pub struct EventWriterHandle {
    writer: Arc<dyn EventWriter>,
    default_level: EventLevel,
}

impl EventWriterHandle {
    /// Register `event_name` under the default provider.
    pub fn new(event_name: &str, threshold: Severity) -> Result<Self, EventWriterError> {
        Self::with_provider(DEFAULT_PROVIDER_NAME, event_name, threshold)
    }

    pub fn with_provider(
        provider_name: &str,
        event_name: &str,
        threshold: Severity,
    ) -> Result<Self, EventWriterError> {
        let writer = create_event_writer(provider_name, event_name)?;
        Ok(Self::from_writer(writer, threshold))
    }

    /// Wrap an already constructed writer.
    pub fn from_writer(writer: Arc<dyn EventWriter>, threshold: Severity) -> Self {
        Self {
            writer,
            default_level: threshold.into(),
        }
    }

    pub fn event_name(&self) -> &str {
        self.writer.event_name()
    }

    pub fn default_level(&self) -> EventLevel {
        self.default_level
    }
}

impl std::fmt::Debug for EventWriterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventWriterHandle")
            .field("event_name", &self.writer.event_name())
            .field("default_level", &self.default_level)
            .finish()
    }
}

fn to_io_error(e: EventWriterError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

impl io::Write for EventWriterHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer
            .write_event(self.default_level, buf)
            .map_err(to_io_error)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().map_err(to_io_error)
    }
}

/// Per-record writer handed out by [`EventWriterHandle`].
pub struct LevelWriter<'a> {
    writer: &'a dyn EventWriter,
    level: EventLevel,
}

impl io::Write for LevelWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Formatters terminate records with a newline; the event field doesn't need it.
        let payload = buf.strip_suffix(b"\n").unwrap_or(buf);
        self.writer
            .write_event(self.level, payload)
            .map(|_| buf.len())
            .map_err(to_io_error)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().map_err(to_io_error)
    }
}

impl<'a> MakeWriter<'a> for EventWriterHandle {
    type Writer = LevelWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LevelWriter {
            writer: self.writer.as_ref(),
            level: self.default_level,
        }
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        LevelWriter {
            writer: self.writer.as_ref(),
            level: Severity::from(*meta.level()).into(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Writer that records every event it is handed.
    #[derive(Default)]
    pub struct RecordingEventWriter {
        pub events: Mutex<Vec<(EventLevel, String)>>,
    }

    impl EventWriter for RecordingEventWriter {
        fn write_event(&self, level: EventLevel, payload: &[u8]) -> Result<usize, EventWriterError> {
            self.events
                .lock()
                .push((level, String::from_utf8_lossy(payload).into_owned()));
            Ok(payload.len())
        }

        fn flush(&self) -> Result<(), EventWriterError> {
            Ok(())
        }

        fn event_name(&self) -> &str {
            "recording"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingEventWriter;
    use super::*;
    use std::io::Write;

    #[test]
    fn test_severity_to_event_level_table() {
        assert_eq!(EventLevel::from(Severity::Debug), EventLevel::Verbose);
        assert_eq!(EventLevel::from(Severity::Info), EventLevel::Informational);
        assert_eq!(EventLevel::from(Severity::Warning), EventLevel::Warning);
        assert_eq!(EventLevel::from(Severity::Error), EventLevel::Error);
        assert_eq!(EventLevel::from(Severity::Critical), EventLevel::Critical);
    }

    #[test]
    fn test_native_level_values() {
        assert_eq!(EventLevel::LogAlways.as_u8(), 0);
        assert_eq!(EventLevel::Critical.as_u8(), 1);
        assert_eq!(EventLevel::Verbose.as_u8(), 5);
    }

    #[test]
    fn test_handle_write_uses_threshold_level() {
        let recorder = Arc::new(RecordingEventWriter::default());
        let mut handle = EventWriterHandle::from_writer(recorder.clone(), Severity::Warning);

        assert_eq!(handle.write(b"hello").unwrap(), 5);
        handle.flush().unwrap();

        let events = recorder.events.lock();
        assert_eq!(events.as_slice(), &[(EventLevel::Warning, "hello".to_string())]);
    }

    #[test]
    fn test_level_writer_strips_trailing_newline() {
        let recorder = Arc::new(RecordingEventWriter::default());
        let handle = EventWriterHandle::from_writer(recorder.clone(), Severity::Info);

        let mut writer = handle.make_writer();
        assert_eq!(writer.write(b"{\"a\":1}\n").unwrap(), 8);

        let events = recorder.events.lock();
        assert_eq!(events[0].1, "{\"a\":1}");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_handle_construction_unsupported() {
        let err = EventWriterHandle::new("Azure-CNI", Severity::Info).unwrap_err();
        assert_eq!(err, EventWriterError::Unsupported);
    }
}
