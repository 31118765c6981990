//! Error types for the HAP-BLE codec.
//!
//! Every fault a decoder can hit is a distinct variant so that callers can
//! tell a truncated header from a lying length field. The transaction
//! engine wraps these in its own error sum together with the offending
//! response bytes; nothing in this crate carries transport context.

use thiserror::Error;

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding HAP-BLE PDUs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer ended before a complete PDU header could be read.
    #[error("header too short: expected at least {expected} bytes, got {actual}")]
    HeaderTooShort {
        /// Minimum number of bytes the header needs
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Opcode byte not in the HAP opcode table.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpCode(u8),

    /// Status byte not in the HAP status table.
    #[error("unknown status code {0:#04x}")]
    UnknownStatusCode(u8),

    /// Control field does not match what the transaction expects.
    #[error("unexpected control field {actual:#04x}, expected {expected:#04x}")]
    UnexpectedControlField {
        /// Control field the transaction was waiting for
        expected: u8,
        /// Control field actually received
        actual: u8,
    },

    /// A continuation header appeared where a first fragment was required.
    #[error("unexpected continuation fragment")]
    UnexpectedContinuation,

    /// Declared body length disagrees with the bytes on the wire.
    #[error("body length mismatch: declared {declared}, got {actual}")]
    BodyLengthMismatch {
        /// Length the PDU header declared
        declared: usize,
        /// Body bytes actually seen
        actual: usize,
    },

    /// A continuation response carried no body bytes.
    ///
    /// Accepting these would let a misbehaving peripheral stall reassembly
    /// forever, so they are rejected outright.
    #[error("continuation response carried no body bytes")]
    EmptyContinuation,

    /// A TLV item was cut off before its length byte.
    #[error("TLV item truncated before its length byte")]
    TlvTruncated,

    /// A TLV length field points past the end of the buffer.
    #[error("TLV length {declared} exceeds remaining buffer ({remaining} bytes)")]
    TlvOverrun {
        /// Length the TLV declared
        declared: usize,
        /// Bytes left in the buffer
        remaining: usize,
    },

    /// A single TLV fragment cannot carry more than 255 value bytes.
    #[error("TLV value too long for a single fragment: {len} bytes")]
    TlvValueTooLong {
        /// Length of the rejected value
        len: usize,
    },

    /// Presentation format code not in the GATT format table.
    #[error("unknown format code {0:#04x}")]
    UnknownFormatCode(u8),

    /// Unit code not in the GATT unit table.
    #[error("unknown unit code {0:#06x}")]
    UnknownUnitCode(u16),

    /// GATT presentation format descriptor is not exactly seven bytes.
    #[error("presentation format descriptor has {actual} bytes, expected 7")]
    PresentationFormatLength {
        /// Bytes actually present
        actual: usize,
    },

    /// A valid-range value cannot be split into two equal halves.
    #[error("valid range with odd length {actual} cannot be split")]
    ValidRangeLength {
        /// Length of the range value
        actual: usize,
    },

    /// Value bytes do not match the declared format's width.
    #[error("{format} value expects {expected} bytes, got {actual}")]
    ValueLength {
        /// Format the value was decoded as
        format: &'static str,
        /// Width the format requires
        expected: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// String value is not valid UTF-8.
    #[error("string value is not valid UTF-8")]
    InvalidUtf8,

    /// Characteristic instance id descriptor is not sixteen bytes.
    #[error("instance id descriptor has {actual} bytes, expected 16")]
    InstanceIdLength {
        /// Bytes actually present
        actual: usize,
    },
}
