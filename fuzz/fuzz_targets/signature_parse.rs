//! The signature parser must reject garbage without panicking.

#![no_main]

use haplink_proto::{HapFormat, parse_signature};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = parse_signature(data, None);
    let _ = parse_signature(data, Some(HapFormat::U8));
});
