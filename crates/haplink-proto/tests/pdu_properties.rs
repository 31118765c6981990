//! Property-based tests for the PDU codec.
//!
//! These verify the round-trip laws for all valid inputs, not just the
//! literal scenario vectors: header encode/decode identity, TLV stream
//! identity under coalescing, and the fragmenter invariants (frame size
//! bound, continuation flags, reassembly).

use haplink_proto::{
    CONTROL_CONTINUATION, DEFAULT_MAX_FRAME, MIN_FRAME, OpCode, RequestHeader, ResponseHeader,
    TlvItem, coalesce, encode_items, fragment_request,
};
use proptest::prelude::*;

/// Strategy for generating arbitrary opcodes
fn arbitrary_opcode() -> impl Strategy<Value = OpCode> {
    prop_oneof![
        Just(OpCode::CharacteristicSignatureRead),
        Just(OpCode::CharacteristicWrite),
        Just(OpCode::CharacteristicRead),
        Just(OpCode::CharacteristicTimedWrite),
        Just(OpCode::CharacteristicExecuteWrite),
        Just(OpCode::ServiceSignatureRead),
        Just(OpCode::CharacteristicConfiguration),
        Just(OpCode::ProtocolConfiguration),
    ]
}

/// Strategy for generating arbitrary request headers
fn arbitrary_header() -> impl Strategy<Value = RequestHeader> {
    (arbitrary_opcode(), any::<[u8; 16]>(), any::<u8>(), any::<bool>()).prop_map(
        |(op_code, cid_sid, tid, response)| {
            RequestHeader::new(cid_sid, op_code, tid).with_response_bit(response)
        },
    )
}

/// Strategy for generating logical TLV item lists
fn arbitrary_items() -> impl Strategy<Value = Vec<TlvItem>> {
    prop::collection::vec(
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..700)),
        1..5,
    )
    .prop_map(|raw| {
        // Coalescing merges adjacent same-kind items, so deduplicate
        // neighbors to keep the round-trip comparison exact.
        let mut items: Vec<TlvItem> = Vec::new();
        for (kind, value) in raw {
            match items.last() {
                Some(last) if last.kind == kind => {},
                _ => items.push(TlvItem::new(kind, value)),
            }
        }
        items
    })
}

#[test]
fn prop_request_header_round_trip() {
    proptest!(|(header in arbitrary_header())| {
        let mut wire = Vec::new();
        header.encode_first(&mut wire);
        prop_assert_eq!(wire.len(), RequestHeader::FIRST_SIZE);

        let decoded = RequestHeader::decode(&wire).expect("should decode");
        prop_assert_eq!(decoded, header);
    });
}

#[test]
fn prop_response_header_byte_triple_round_trip() {
    proptest!(|(control in any::<u8>(), tid in any::<u8>(), status in any::<u8>())| {
        let wire = [control, tid, status];
        let header = ResponseHeader::decode(&wire).expect("should decode");
        prop_assert_eq!(header.encode(), wire);

        prop_assert_eq!(header.is_continuation(), control & CONTROL_CONTINUATION != 0);
    });
}

#[test]
fn prop_tlv_stream_round_trip() {
    proptest!(|(items in arbitrary_items())| {
        let mut wire = Vec::new();
        encode_items(&mut wire, &items);

        let decoded = coalesce(&wire).expect("should decode");
        prop_assert_eq!(decoded, items);
    });
}

#[test]
fn prop_fragmenter_invariants() {
    proptest!(|(
        header in arbitrary_header(),
        items in arbitrary_items(),
        max_frame in MIN_FRAME..=DEFAULT_MAX_FRAME,
    )| {
        let frames = fragment_request(&header, &items, max_frame);
        prop_assert!(!frames.is_empty());

        let mut reassembled = Vec::new();
        for (idx, frame) in frames.iter().enumerate() {
            // PROPERTY: no frame exceeds the MTU budget.
            prop_assert!(frame.len() <= max_frame);

            // PROPERTY: continuation flag clear on the first frame, set on
            // all later frames; tid identical across frames.
            if idx == 0 {
                prop_assert_eq!(frame[0] & CONTROL_CONTINUATION, 0);
                prop_assert_eq!(frame[2], header.tid());
                reassembled.extend_from_slice(&frame[RequestHeader::FIRST_SIZE + 2..]);
            } else {
                prop_assert_eq!(frame[0] & CONTROL_CONTINUATION, CONTROL_CONTINUATION);
                prop_assert_eq!(frame[1], header.tid());
                reassembled.extend_from_slice(&frame[RequestHeader::CONTINUATION_SIZE + 2..]);
            }
        }

        // PROPERTY: body bytes across frames reassemble to the original
        // logical TLV stream.
        prop_assert_eq!(coalesce(&reassembled).expect("reassembled stream"), items);
    });
}

#[test]
fn prop_single_frame_when_it_fits() {
    proptest!(|(header in arbitrary_header(), value in prop::collection::vec(any::<u8>(), 0..100))| {
        let items = vec![TlvItem::new(0x01, value)];
        let frames = fragment_request(&header, &items, DEFAULT_MAX_FRAME);
        prop_assert_eq!(frames.len(), 1);
    });
}
