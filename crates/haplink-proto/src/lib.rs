//! HAP-BLE PDU codec.
//!
//! Wire-level building blocks for the HomeKit Accessory Protocol over
//! Bluetooth LE: request/response PDU headers, TLV bodies, the
//! characteristic signature parser and the outbound fragmenter.
//!
//! Everything in this crate is pure and transport-free. `haplink-core`
//! provides the transaction engine that drives these types over a GATT
//! link, and `haplink-client` the per-characteristic façade.

#![forbid(unsafe_code)]

pub mod errors;
pub mod fragment;
pub mod header;
pub mod opcode;
pub mod param;
pub mod signature;
pub mod status;
pub mod tlv;
pub mod value;

pub use errors::{ProtocolError, Result};
pub use fragment::{DEFAULT_MAX_FRAME, MIN_FRAME, fragment_request};
pub use header::{CONTROL_CONTINUATION, CONTROL_RESPONSE, RequestHeader, ResponseHeader};
pub use opcode::OpCode;
pub use param::HapParam;
pub use signature::{CharacteristicDescriptor, parse_signature};
pub use status::HapStatus;
pub use tlv::{TlvItem, TlvReader, coalesce, encode_items, encode_tlv};
pub use value::{HapFormat, HapUnit, HapValue, PresentationFormat};
