//! HAP status code table.

/// Status codes a peripheral can return in a response PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HapStatus {
    /// The request completed successfully.
    Success = 0x00,
    /// The PDU or opcode is not supported.
    UnsupportedPdu = 0x01,
    /// The accessory is already handling its maximum number of procedures.
    MaxProcedures = 0x02,
    /// The caller lacks authorization for this operation.
    InsufficientAuthorization = 0x03,
    /// The addressed instance id does not exist.
    InvalidInstanceId = 0x04,
    /// A secure session is required for this operation.
    InsufficientAuthentication = 0x05,
    /// The request PDU was malformed or otherwise invalid.
    InvalidRequest = 0x06,
}

impl HapStatus {
    /// Wire value of this status.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Status for a wire value. `None` if unrecognized.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Success),
            0x01 => Some(Self::UnsupportedPdu),
            0x02 => Some(Self::MaxProcedures),
            0x03 => Some(Self::InsufficientAuthorization),
            0x04 => Some(Self::InvalidInstanceId),
            0x05 => Some(Self::InsufficientAuthentication),
            0x06 => Some(Self::InvalidRequest),
            _ => None,
        }
    }

    /// `true` only for [`HapStatus::Success`].
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Canonical status name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::UnsupportedPdu => "Unsupported-PDU",
            Self::MaxProcedures => "Max-Procedures",
            Self::InsufficientAuthorization => "Insufficient Authorization",
            Self::InvalidInstanceId => "Invalid Instance ID",
            Self::InsufficientAuthentication => "Insufficient Authentication",
            Self::InvalidRequest => "Invalid Request",
        }
    }

    /// Human-readable status message.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Success => "The request was successful.",
            Self::UnsupportedPdu => "The PDU or opcode is not supported.",
            Self::MaxProcedures => {
                "The accessory has reached the limit of simultaneous procedures."
            },
            Self::InsufficientAuthorization => {
                "Insufficient authorization to perform this operation."
            },
            Self::InvalidInstanceId => "The requested instance id does not exist.",
            Self::InsufficientAuthentication => {
                "A secure session is required to perform this operation."
            },
            Self::InvalidRequest => "The request was invalid.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        for code in 0x00..=0x06u8 {
            let status = HapStatus::from_u8(code).unwrap();
            assert_eq!(status.to_u8(), code);
        }
        assert_eq!(HapStatus::from_u8(0x07), None);
    }

    #[test]
    fn invalid_request_name() {
        assert_eq!(HapStatus::InvalidRequest.name(), "Invalid Request");
    }

    #[test]
    fn only_zero_is_success() {
        assert!(HapStatus::Success.is_success());
        assert!(!HapStatus::InvalidRequest.is_success());
    }
}
