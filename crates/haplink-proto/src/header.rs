//! HAP-BLE PDU headers.
//!
//! A request PDU opens with a 19-byte header on its first fragment
//! (`[control, opcode, tid] ++ cid_sid`) and a 2-byte header
//! (`[control, tid]`) on continuation fragments, which omit the opcode and
//! instance id. Responses open with a fixed 3-byte header
//! (`[control, tid, status]`).
//!
//! The control field is bit-packed with bit 1 carrying the response flag
//! and bit 7 the continuation flag (LSB = bit 0). Construction is
//! bit-exact: observed peripherals reject frames that set reserved bits.

use bytes::BufMut;

use crate::{
    OpCode,
    errors::{ProtocolError, Result},
    status::HapStatus,
};

/// Control-field bit for the response flag (bit 1).
pub const CONTROL_RESPONSE: u8 = 1 << 1;

/// Control-field bit for the continuation flag (bit 7).
pub const CONTROL_CONTINUATION: u8 = 1 << 7;

/// Header of a request PDU.
///
/// The transaction id is chosen once per logical transaction and shared by
/// every fragment; peripherals echo it in the response header.
///
/// The response bit defaults to **set** (control field 0x02), the
/// convention of the peripherals this library was written against. Callers
/// talking to a peripheral that follows the strict request convention
/// (control field 0x00) clear it with [`RequestHeader::with_response_bit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    cid_sid: [u8; 16],
    op_code: OpCode,
    tid: u8,
    response: bool,
}

impl RequestHeader {
    /// Serialized size of a first-fragment header.
    pub const FIRST_SIZE: usize = 19;

    /// Serialized size of a continuation header.
    pub const CONTINUATION_SIZE: usize = 2;

    /// Create a header addressing the given characteristic or service
    /// instance id.
    #[must_use]
    pub fn new(cid_sid: [u8; 16], op_code: OpCode, tid: u8) -> Self {
        Self { cid_sid, op_code, tid, response: true }
    }

    /// Override the response bit.
    #[must_use]
    pub fn with_response_bit(mut self, response: bool) -> Self {
        self.response = response;
        self
    }

    /// Instance id this request addresses.
    #[must_use]
    pub fn cid_sid(&self) -> &[u8; 16] {
        &self.cid_sid
    }

    /// HAP opcode.
    #[must_use]
    pub fn op_code(&self) -> OpCode {
        self.op_code
    }

    /// Transaction id shared by all fragments of this transaction.
    #[must_use]
    pub fn tid(&self) -> u8 {
        self.tid
    }

    /// Control field for a first or continuation fragment.
    ///
    /// Bit 1 carries the response flag and bit 7 the continuation flag;
    /// every other bit is zero.
    #[must_use]
    pub fn control_field(&self, continuation: bool) -> u8 {
        let mut control = 0u8;
        if self.response {
            control |= CONTROL_RESPONSE;
        }
        if continuation {
            control |= CONTROL_CONTINUATION;
        }
        control
    }

    /// Control field the matching response must carry on its first
    /// fragment: the request's control field with the response bit set.
    ///
    /// Computing it this way validates consistently under either request
    /// convention (response bit set or clear on the request).
    #[must_use]
    pub fn expected_response_control(&self) -> u8 {
        self.control_field(false) | CONTROL_RESPONSE
    }

    /// Encode the 19-byte first-fragment header.
    pub fn encode_first(&self, dst: &mut impl BufMut) {
        dst.put_u8(self.control_field(false));
        dst.put_u8(self.op_code.to_u8());
        dst.put_u8(self.tid);
        dst.put_slice(&self.cid_sid);
    }

    /// Encode the 2-byte continuation header.
    pub fn encode_continuation(&self, dst: &mut impl BufMut) {
        dst.put_u8(self.control_field(true));
        dst.put_u8(self.tid);
    }

    /// Decode a first-fragment request header.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::HeaderTooShort` on fewer than 19 bytes
    /// - `ProtocolError::UnexpectedContinuation` if the continuation bit is
    ///   set (continuation headers carry no opcode or instance id and
    ///   cannot be decoded standalone)
    /// - `ProtocolError::UnknownOpCode` on an unrecognized opcode byte
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::FIRST_SIZE {
            return Err(ProtocolError::HeaderTooShort {
                expected: Self::FIRST_SIZE,
                actual: bytes.len(),
            });
        }

        let control = bytes[0];
        if control & CONTROL_CONTINUATION != 0 {
            return Err(ProtocolError::UnexpectedContinuation);
        }

        let op_code = OpCode::from_u8(bytes[1]).ok_or(ProtocolError::UnknownOpCode(bytes[1]))?;

        let mut cid_sid = [0u8; 16];
        cid_sid.copy_from_slice(&bytes[3..Self::FIRST_SIZE]);

        Ok(Self { cid_sid, op_code, tid: bytes[2], response: control & CONTROL_RESPONSE != 0 })
    }
}

/// Header of a response PDU.
///
/// The status byte is kept raw so that `encode(decode(h)) == h` holds for
/// every byte triple; [`ResponseHeader::status`] resolves it against the
/// HAP status table on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    control_field: u8,
    tid: u8,
    status_code: u8,
}

impl ResponseHeader {
    /// Serialized size of a response header.
    pub const SIZE: usize = 3;

    /// Build a header from raw fields (fake peripherals, tests).
    #[must_use]
    pub fn new(control_field: u8, tid: u8, status_code: u8) -> Self {
        Self { control_field, tid, status_code }
    }

    /// Decode the first three bytes of a response PDU.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::HeaderTooShort` on fewer than 3 bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(ProtocolError::HeaderTooShort {
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self { control_field: bytes[0], tid: bytes[1], status_code: bytes[2] })
    }

    /// Serialize back to the 3-byte wire form.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        [self.control_field, self.tid, self.status_code]
    }

    /// Raw control field byte.
    #[must_use]
    pub fn control_field(&self) -> u8 {
        self.control_field
    }

    /// Transaction id echoed by the peripheral.
    #[must_use]
    pub fn tid(&self) -> u8 {
        self.tid
    }

    /// Raw status byte.
    #[must_use]
    pub fn status_code(&self) -> u8 {
        self.status_code
    }

    /// Status resolved against the HAP status table.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownStatusCode` if the byte is not in the table
    pub fn status(&self) -> Result<HapStatus> {
        HapStatus::from_u8(self.status_code)
            .ok_or(ProtocolError::UnknownStatusCode(self.status_code))
    }

    /// Response flag (bit 1).
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.control_field & CONTROL_RESPONSE != 0
    }

    /// Continuation flag (bit 7).
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.control_field & CONTROL_CONTINUATION != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential_cid() -> [u8; 16] {
        let mut cid = [0u8; 16];
        for (i, byte) in cid.iter_mut().enumerate() {
            *byte = i as u8;
        }
        cid
    }

    #[test]
    fn signature_read_header_bytes() {
        // Characteristic_Signature_Read of instance 0x00..0x0F with tid 0x42.
        let header =
            RequestHeader::new(sequential_cid(), OpCode::CharacteristicSignatureRead, 0x42);

        let mut wire = Vec::new();
        header.encode_first(&mut wire);

        let expected =
            hex::decode("020142000102030405060708090a0b0c0d0e0f").unwrap();
        assert_eq!(wire, expected);
    }

    #[test]
    fn continuation_header_bytes() {
        let header = RequestHeader::new(sequential_cid(), OpCode::CharacteristicWrite, 0x10);

        let mut wire = Vec::new();
        header.encode_continuation(&mut wire);

        assert_eq!(wire, vec![0x82, 0x10]);
    }

    #[test]
    fn strict_convention_clears_response_bit() {
        let header = RequestHeader::new(sequential_cid(), OpCode::CharacteristicRead, 0x01)
            .with_response_bit(false);

        assert_eq!(header.control_field(false), 0x00);
        assert_eq!(header.control_field(true), 0x80);
        // Responses still validate against the response-bit-set form.
        assert_eq!(header.expected_response_control(), 0x02);
    }

    #[test]
    fn request_header_round_trip() {
        let header = RequestHeader::new(sequential_cid(), OpCode::ServiceSignatureRead, 0x7F);

        let mut wire = Vec::new();
        header.encode_first(&mut wire);

        let decoded = RequestHeader::decode(&wire).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn reject_short_request_header() {
        let result = RequestHeader::decode(&[0x02, 0x01, 0x42]);
        assert_eq!(
            result,
            Err(ProtocolError::HeaderTooShort { expected: 19, actual: 3 })
        );
    }

    #[test]
    fn reject_continuation_as_first_fragment() {
        let mut wire = vec![0x82, 0x01, 0x42];
        wire.extend_from_slice(&sequential_cid());
        assert_eq!(RequestHeader::decode(&wire), Err(ProtocolError::UnexpectedContinuation));
    }

    #[test]
    fn reject_unknown_opcode() {
        let mut wire = vec![0x02, 0xAA, 0x42];
        wire.extend_from_slice(&sequential_cid());
        assert_eq!(RequestHeader::decode(&wire), Err(ProtocolError::UnknownOpCode(0xAA)));
    }

    #[test]
    fn response_header_fields() {
        let header = ResponseHeader::decode(&[0x02, 0x42, 0x00]).unwrap();
        assert!(header.is_response());
        assert!(!header.is_continuation());
        assert_eq!(header.tid(), 0x42);
        assert_eq!(header.status().unwrap(), HapStatus::Success);
    }

    #[test]
    fn response_header_round_trips_every_triple() {
        // Exhaustive over control field and status; tid is linear.
        for control in 0..=u8::MAX {
            let header = ResponseHeader::new(control, control.wrapping_add(1), 0x03);
            assert_eq!(ResponseHeader::decode(&header.encode()).unwrap(), header);
        }
    }

    #[test]
    fn unknown_status_is_an_error() {
        let header = ResponseHeader::decode(&[0x02, 0x42, 0x99]).unwrap();
        assert_eq!(header.status(), Err(ProtocolError::UnknownStatusCode(0x99)));
    }

    #[test]
    fn reject_short_response_header() {
        assert_eq!(
            ResponseHeader::decode(&[0x02, 0x42]),
            Err(ProtocolError::HeaderTooShort { expected: 3, actual: 2 })
        );
    }
}
