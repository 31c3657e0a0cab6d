//! Fuzz target for relay frame decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use telemetry_dispatch::sink::decode_frame;

fuzz_target!(|data: &[u8]| {
    let _ = decode_frame(data);
});
