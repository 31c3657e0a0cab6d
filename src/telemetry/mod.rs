//! Logging side of the dispatch layer.
//!
//! Subscriber setup (with the optional event-writer tee), the structured
//! logger capability handed to the client, and local dispatch counters.

mod logger;
mod logging;
pub mod metrics;

pub use logger::{StructuredLogger, TracingLogger, LOG_TARGET};
pub use logging::{
    event_writer_layer, init_logging, tee_layer, EventWriterConfig, EventWriterLayer, LogConfig,
    LogError, LogFormat,
};
