//! Fuzz target for connection string parsing.
//!
//! Arbitrary input must yield Ok or Err, never a panic. Accepted input must
//! carry a non-empty key and a URL ending in the track suffix.

#![no_main]

use libfuzzer_sys::fuzz_target;
use telemetry_dispatch::connection_string::{parse, TRACK_API_SUFFIX};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(params) = parse(s) {
            assert!(!params.instrumentation_key().is_empty());
            assert!(params.ingestion_url().ends_with(TRACK_API_SUFFIX));
        }
    }
});
