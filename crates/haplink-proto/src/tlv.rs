//! Type-length-value bodies.
//!
//! PDU bodies are a concatenation of TLV items: one type byte, one length
//! byte (0-255) and that many value bytes. A logical value longer than 255
//! bytes is carried as successive fragments sharing the same type; readers
//! concatenate contiguous same-type fragments back into one item.

use bytes::BufMut;

use crate::errors::{ProtocolError, Result};

/// Largest value a single TLV fragment can carry.
pub const MAX_FRAGMENT_VALUE: usize = 255;

/// One logical TLV item, of any length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvItem {
    /// Parameter type byte.
    pub kind: u8,
    /// Value bytes (chunked at 255 on the wire when longer).
    pub value: Vec<u8>,
}

impl TlvItem {
    /// Create an item.
    #[must_use]
    pub fn new(kind: u8, value: impl Into<Vec<u8>>) -> Self {
        Self { kind, value: value.into() }
    }
}

/// Encode a single TLV fragment.
///
/// # Errors
///
/// - `ProtocolError::TlvValueTooLong` when `value` exceeds 255 bytes;
///   callers with longer values go through [`encode_items`], which chunks.
pub fn encode_tlv(dst: &mut impl BufMut, kind: u8, value: &[u8]) -> Result<()> {
    if value.len() > MAX_FRAGMENT_VALUE {
        return Err(ProtocolError::TlvValueTooLong { len: value.len() });
    }
    dst.put_u8(kind);
    dst.put_u8(value.len() as u8);
    dst.put_slice(value);
    Ok(())
}

/// Encode logical items into a TLV stream, splitting long values at
/// 255-byte boundaries into successive same-type fragments.
pub fn encode_items(dst: &mut impl BufMut, items: &[TlvItem]) {
    for item in items {
        if item.value.is_empty() {
            dst.put_u8(item.kind);
            dst.put_u8(0);
            continue;
        }
        for chunk in item.value.chunks(MAX_FRAGMENT_VALUE) {
            dst.put_u8(item.kind);
            dst.put_u8(chunk.len() as u8);
            dst.put_slice(chunk);
        }
    }
}

/// Serialized size of `items` after 255-byte chunking.
#[must_use]
pub fn encoded_len(items: &[TlvItem]) -> usize {
    items
        .iter()
        .map(|item| {
            if item.value.is_empty() {
                2
            } else {
                item.value.len() + 2 * item.value.len().div_ceil(MAX_FRAGMENT_VALUE)
            }
        })
        .sum()
}

/// One wire-level TLV fragment borrowed from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvFragment<'a> {
    /// Parameter type byte.
    pub kind: u8,
    /// Fragment value (at most 255 bytes).
    pub value: &'a [u8],
}

/// Lazy reader over a TLV stream.
///
/// Yields fragments until the buffer is exhausted. A length byte pointing
/// past the end of the buffer yields `ProtocolError::TlvOverrun` and ends
/// the iteration.
#[derive(Debug, Clone)]
pub struct TlvReader<'a> {
    buf: &'a [u8],
}

impl<'a> TlvReader<'a> {
    /// Read fragments out of `buf`.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }
}

impl<'a> Iterator for TlvReader<'a> {
    type Item = Result<TlvFragment<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        if self.buf.len() < 2 {
            self.buf = &[];
            return Some(Err(ProtocolError::TlvTruncated));
        }

        let kind = self.buf[0];
        let declared = self.buf[1] as usize;
        let rest = &self.buf[2..];

        if declared > rest.len() {
            self.buf = &[];
            return Some(Err(ProtocolError::TlvOverrun { declared, remaining: rest.len() }));
        }

        let (value, tail) = rest.split_at(declared);
        self.buf = tail;
        Some(Ok(TlvFragment { kind, value }))
    }
}

/// Read a whole stream, concatenating contiguous same-type fragments back
/// into logical items.
///
/// # Errors
///
/// Propagates the first reader error (`TlvTruncated`, `TlvOverrun`).
pub fn coalesce(bytes: &[u8]) -> Result<Vec<TlvItem>> {
    let mut items: Vec<TlvItem> = Vec::new();
    for fragment in TlvReader::new(bytes) {
        let fragment = fragment?;
        match items.last_mut() {
            Some(last) if last.kind == fragment.kind => {
                last.value.extend_from_slice(fragment.value);
            },
            _ => items.push(TlvItem::new(fragment.kind, fragment.value)),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_item_round_trip() {
        let mut wire = Vec::new();
        encode_tlv(&mut wire, 0x01, &[0xAB, 0xCD]).unwrap();
        assert_eq!(wire, vec![0x01, 0x02, 0xAB, 0xCD]);

        let items = coalesce(&wire).unwrap();
        assert_eq!(items, vec![TlvItem::new(0x01, vec![0xAB, 0xCD])]);
    }

    #[test]
    fn oversized_fragment_rejected() {
        let mut wire = Vec::new();
        let value = vec![0u8; 256];
        assert_eq!(
            encode_tlv(&mut wire, 0x01, &value),
            Err(ProtocolError::TlvValueTooLong { len: 256 })
        );
    }

    #[test]
    fn long_value_chunks_and_coalesces() {
        let value: Vec<u8> = (0..600).map(|i| (i % 251) as u8).collect();
        let items = vec![TlvItem::new(0x01, value.clone())];

        let mut wire = Vec::new();
        encode_items(&mut wire, &items);

        // 600 bytes -> fragments of 255 + 255 + 90, each with 2 header bytes.
        assert_eq!(wire.len(), 600 + 3 * 2);
        assert_eq!(encoded_len(&items), wire.len());

        assert_eq!(coalesce(&wire).unwrap(), items);
    }

    #[test]
    fn empty_value_encodes_as_two_bytes() {
        let items = vec![TlvItem::new(0x09, Vec::new())];
        let mut wire = Vec::new();
        encode_items(&mut wire, &items);
        assert_eq!(wire, vec![0x09, 0x00]);
        assert_eq!(coalesce(&wire).unwrap(), items);
    }

    #[test]
    fn distinct_types_stay_separate() {
        let mut wire = Vec::new();
        encode_tlv(&mut wire, 0x01, &[0x01]).unwrap();
        encode_tlv(&mut wire, 0x02, &[0x02]).unwrap();
        encode_tlv(&mut wire, 0x01, &[0x03]).unwrap();

        let items = coalesce(&wire).unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn overrun_reported() {
        // Declares 5 value bytes, provides 2.
        let wire = [0x01, 0x05, 0xAA, 0xBB];
        assert_eq!(
            coalesce(&wire),
            Err(ProtocolError::TlvOverrun { declared: 5, remaining: 2 })
        );
    }

    #[test]
    fn truncated_header_reported() {
        let wire = [0x01];
        assert_eq!(coalesce(&wire), Err(ProtocolError::TlvTruncated));
    }

    #[test]
    fn reader_is_lazy() {
        let mut wire = Vec::new();
        encode_tlv(&mut wire, 0x01, &[0x01]).unwrap();
        wire.extend_from_slice(&[0x02, 0xFF]); // overruns

        let mut reader = TlvReader::new(&wire);
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }
}
