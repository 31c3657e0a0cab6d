//! Platform event writer tests.

use telemetry_dispatch::event_writer::{create_event_writer, EventLevel, DEFAULT_PROVIDER_NAME};
use telemetry_dispatch::telemetry::{event_writer_layer, EventWriterConfig};
use telemetry_dispatch::{EventWriterError, EventWriterHandle, Severity};

#[cfg(windows)]
use telemetry_dispatch::EventWriter;

#[test]
fn severity_maps_to_native_levels() {
    assert_eq!(EventLevel::from(Severity::Debug).as_u8(), 5);
    assert_eq!(EventLevel::from(Severity::Info).as_u8(), 4);
    assert_eq!(EventLevel::from(Severity::Warning).as_u8(), 3);
    assert_eq!(EventLevel::from(Severity::Error).as_u8(), 2);
    assert_eq!(EventLevel::from(Severity::Critical).as_u8(), 1);
}

#[cfg(not(windows))]
#[test]
fn construction_is_unsupported_off_windows() {
    assert_eq!(
        create_event_writer(DEFAULT_PROVIDER_NAME, "Azure-CNI").err(),
        Some(EventWriterError::Unsupported)
    );
    assert!(matches!(
        EventWriterHandle::new("Azure-CNI", Severity::Info),
        Err(EventWriterError::Unsupported)
    ));
    let config = EventWriterConfig::new("Azure-CNI", Severity::Info);
    assert!(event_writer_layer::<tracing_subscriber::Registry>(&config).is_err());
}

#[cfg(windows)]
#[test]
fn etw_writer_accepts_events() {
    let writer = create_event_writer(DEFAULT_PROVIDER_NAME, "Azure-CNI-Test").unwrap();
    assert_eq!(writer.event_name(), "Azure-CNI-Test");
    let written = writer.write_event(EventLevel::Informational, b"hello").unwrap();
    assert_eq!(written, 5);
    assert!(writer.flush().is_ok());
}
