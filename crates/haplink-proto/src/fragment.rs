//! Outbound request fragmentation.
//!
//! A single GATT write cannot exceed the negotiated ATT MTU, but a logical
//! HAP-BLE body can. Oversized bodies are split across frames: the first
//! frame opens with the 19-byte request header, every later frame with the
//! 2-byte continuation header, and each frame carries its own little-endian
//! body length. A TLV that does not fit a frame whole is split at the
//! boundary with the remainder re-emitted under the same type, so every
//! frame body is a valid TLV stream on its own and readers reassemble the
//! logical items by coalescing.

use bytes::BufMut;

use crate::{
    header::RequestHeader,
    tlv::{MAX_FRAGMENT_VALUE, TlvItem},
};

/// Default maximum serialized frame size (the ATT MTU ceiling).
///
/// Peripherals negotiating a smaller MTU pass their own limit; see
/// [`fragment_request`].
pub const DEFAULT_MAX_FRAME: usize = 512;

/// Smallest workable frame size: a first-fragment header, a body length
/// prefix and one TLV fragment carrying a single value byte.
pub const MIN_FRAME: usize = RequestHeader::FIRST_SIZE + 2 + 3;

/// Split a request into frames of at most `max_frame` bytes.
///
/// An empty body yields the bare 19-byte header with no length prefix.
/// A `max_frame` below [`MIN_FRAME`] is treated as [`MIN_FRAME`]. The
/// transaction id and response bit are preserved across every frame.
#[must_use]
pub fn fragment_request(
    header: &RequestHeader,
    items: &[TlvItem],
    max_frame: usize,
) -> Vec<Vec<u8>> {
    let max_frame = max_frame.max(MIN_FRAME);

    if items.is_empty() {
        let mut frame = Vec::with_capacity(RequestHeader::FIRST_SIZE);
        header.encode_first(&mut frame);
        return vec![frame];
    }

    // Per-frame body budgets; header and length prefix are reserved.
    let first_budget = max_frame - RequestHeader::FIRST_SIZE - 2;
    let cont_budget = max_frame - RequestHeader::CONTINUATION_SIZE - 2;

    let mut bodies: Vec<Vec<u8>> = vec![Vec::new()];
    for item in items {
        let mut remaining: &[u8] = &item.value;
        loop {
            let idx = bodies.len() - 1;
            let budget = if idx == 0 { first_budget } else { cont_budget };
            let free = budget.saturating_sub(bodies[idx].len());

            // An empty value needs its two marker bytes; a split needs
            // room for at least one value byte on top.
            let need = if remaining.is_empty() { 2 } else { 3 };
            if free < need {
                bodies.push(Vec::new());
                continue;
            }

            let take = remaining.len().min(MAX_FRAGMENT_VALUE).min(free - 2);
            let body = &mut bodies[idx];
            body.push(item.kind);
            body.push(take as u8);
            body.extend_from_slice(&remaining[..take]);
            remaining = &remaining[take..];

            if remaining.is_empty() {
                break;
            }
        }
    }

    let mut frames = Vec::with_capacity(bodies.len());
    for (idx, body) in bodies.iter().enumerate() {
        let header_size = if idx == 0 {
            RequestHeader::FIRST_SIZE
        } else {
            RequestHeader::CONTINUATION_SIZE
        };

        let mut frame = Vec::with_capacity(header_size + 2 + body.len());
        if idx == 0 {
            header.encode_first(&mut frame);
        } else {
            header.encode_continuation(&mut frame);
        }
        frame.put_u16_le(body.len() as u16);
        frame.put_slice(body);
        frames.push(frame);
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OpCode, header::CONTROL_CONTINUATION, tlv::coalesce};

    fn header(tid: u8) -> RequestHeader {
        let mut cid = [0u8; 16];
        for (i, byte) in cid.iter_mut().enumerate() {
            *byte = i as u8;
        }
        RequestHeader::new(cid, OpCode::CharacteristicWrite, tid)
    }

    #[test]
    fn empty_body_is_bare_header() {
        let frames = fragment_request(&header(0x42), &[], DEFAULT_MAX_FRAME);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), RequestHeader::FIRST_SIZE);
    }

    #[test]
    fn small_write_is_one_frame() {
        // Value TLV of one byte: header + `03 00` + `01 01 01`.
        let items = vec![TlvItem::new(0x01, vec![0x01])];
        let frames = fragment_request(&header(0x10), &items, DEFAULT_MAX_FRAME);

        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.len(), 19 + 2 + 3);
        assert_eq!(&frame[19..21], &[0x03, 0x00]);
        assert_eq!(&frame[21..], &[0x01, 0x01, 0x01]);
    }

    #[test]
    fn six_hundred_byte_body_splits_into_two_frames() {
        let tid = 0x33;
        let value: Vec<u8> = (0..600).map(|i| (i % 251) as u8).collect();
        let items = vec![TlvItem::new(0x01, value)];

        let frames = fragment_request(&header(tid), &items, DEFAULT_MAX_FRAME);
        assert_eq!(frames.len(), 2);

        // Frame 1: full-size first fragment.
        assert_eq!(frames[0].len(), DEFAULT_MAX_FRAME);
        assert_eq!(frames[0][0], 0x02);
        assert_eq!(frames[0][2], tid);

        // Frame 2: continuation header with the same tid.
        assert_eq!(frames[1][0], 0x82);
        assert_eq!(frames[1][1], tid);
        assert!(frames[1].len() <= DEFAULT_MAX_FRAME);
    }

    #[test]
    fn frames_never_exceed_max_and_reassemble() {
        for max_frame in [MIN_FRAME, 64, 128, DEFAULT_MAX_FRAME] {
            let items = vec![
                TlvItem::new(0x01, (0..700).map(|i| (i % 13) as u8).collect::<Vec<_>>()),
                TlvItem::new(0x09, Vec::new()),
                TlvItem::new(0x02, vec![0xAA; 40]),
            ];
            let frames = fragment_request(&header(0x55), &items, max_frame);

            let mut reassembled = Vec::new();
            for (idx, frame) in frames.iter().enumerate() {
                assert!(frame.len() <= max_frame, "frame over budget at max {max_frame}");

                let (header_size, control) = if idx == 0 { (19, frame[0]) } else { (2, frame[0]) };
                if idx == 0 {
                    assert_eq!(control & CONTROL_CONTINUATION, 0);
                } else {
                    assert_eq!(control & CONTROL_CONTINUATION, CONTROL_CONTINUATION);
                }

                let declared =
                    u16::from_le_bytes([frame[header_size], frame[header_size + 1]]) as usize;
                let body = &frame[header_size + 2..];
                assert_eq!(body.len(), declared);
                reassembled.extend_from_slice(body);
            }

            assert_eq!(coalesce(&reassembled).unwrap(), items);
        }
    }

    #[test]
    fn tiny_max_frame_is_clamped() {
        let items = vec![TlvItem::new(0x01, vec![0x00; 10])];
        let frames = fragment_request(&header(0x01), &items, 1);
        for frame in &frames {
            assert!(frame.len() <= MIN_FRAME);
        }
    }
}
