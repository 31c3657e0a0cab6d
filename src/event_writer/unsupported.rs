//! Event writer for platforms without an OS tracing facility.
//!
//! Every operation fails with [`EventWriterError::Unsupported`].

use super::{EventLevel, EventWriter, EventWriterError};

#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedEventWriter;

impl UnsupportedEventWriter {
    pub fn register(_provider_name: &str, _event_name: &str) -> Result<Self, EventWriterError> {
        Err(EventWriterError::Unsupported)
    }
}

impl EventWriter for UnsupportedEventWriter {
    fn write_event(&self, _level: EventLevel, _payload: &[u8]) -> Result<usize, EventWriterError> {
        Err(EventWriterError::Unsupported)
    }

    fn flush(&self) -> Result<(), EventWriterError> {
        Err(EventWriterError::Unsupported)
    }

    fn event_name(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_fails() {
        assert_eq!(
            UnsupportedEventWriter::register("ACN-Data-Plane", "Azure-CNI").unwrap_err(),
            EventWriterError::Unsupported
        );
    }

    #[test]
    fn test_every_operation_fails() {
        let writer = UnsupportedEventWriter;
        assert_eq!(
            writer.write_event(EventLevel::Informational, b"x"),
            Err(EventWriterError::Unsupported)
        );
        assert_eq!(writer.flush(), Err(EventWriterError::Unsupported));
    }
}
