//! TLV stream reading must never panic, and any stream that parses must
//! survive a re-encode/re-parse round trip.

#![no_main]

use haplink_proto::{coalesce, encode_items};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(items) = coalesce(data) {
        let mut wire = Vec::new();
        encode_items(&mut wire, &items);

        let again = coalesce(&wire).expect("re-encoded stream must parse");
        assert_eq!(again, items);
    }
});
