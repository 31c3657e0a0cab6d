//! ETW event writer.
//!
//! Registers a TraceLogging provider and writes one event per record with a
//! single `Message` string field.

use std::pin::Pin;

use parking_lot::Mutex;
use tracelogging_dynamic as tld;

use super::{EventLevel, EventWriter, EventWriterError};

/// ETW-backed [`EventWriter`].
pub struct EtwEventWriter {
    provider: Pin<Box<tld::Provider>>,
    builder: Mutex<tld::EventBuilder>,
    event_name: String,
}

/// Invoked by ETW when a session enables, disables or retunes the provider.
/// Diagnostic only.
fn provider_callback(
    _source_id: &tld::Guid,
    event_control_code: u32,
    level: tld::Level,
    match_any_keyword: u64,
    _match_all_keyword: u64,
    _filter_data: usize,
    _callback_context: usize,
) {
    tracing::debug!(
        control_code = event_control_code,
        level = level.as_int(),
        match_any_keyword,
        "event provider state changed"
    );
}

impl EtwEventWriter {
    pub fn register(provider_name: &str, event_name: &str) -> Result<Self, EventWriterError> {
        let mut options = tld::Provider::options();
        options.callback(provider_callback, 0);
        let provider = Box::pin(tld::Provider::new(provider_name, &options));

        // SAFETY: the provider is pinned for the lifetime of this writer and
        // unregisters itself when dropped.
        let status = unsafe { provider.as_ref().register() };
        if status != 0 {
            return Err(EventWriterError::Registration {
                provider: provider_name.to_string(),
                code: status,
            });
        }

        Ok(Self {
            provider,
            builder: Mutex::new(tld::EventBuilder::new()),
            event_name: event_name.to_string(),
        })
    }
}

impl EventWriter for EtwEventWriter {
    fn write_event(&self, level: EventLevel, payload: &[u8]) -> Result<usize, EventWriterError> {
        let mut builder = self.builder.lock();
        builder.reset(&self.event_name, tld::Level::from_int(level.as_u8()), 0, 0);
        builder.add_str8("Message", payload, tld::OutType::Default, 0);

        let status = builder.write(self.provider.as_ref().get_ref(), None, None);
        if status != 0 {
            return Err(EventWriterError::Write(status));
        }
        Ok(payload.len())
    }

    fn flush(&self) -> Result<(), EventWriterError> {
        Ok(())
    }

    fn event_name(&self) -> &str {
        &self.event_name
    }
}
