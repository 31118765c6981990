//! Response header decode must never panic, and decoding must be the
//! exact inverse of encoding for every byte triple.

#![no_main]

use haplink_proto::ResponseHeader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = ResponseHeader::decode(data) {
        let encoded = header.encode();
        assert_eq!(&encoded[..], &data[..ResponseHeader::SIZE]);
    }
});
