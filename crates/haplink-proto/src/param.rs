//! HAP-BLE TLV parameter table.

use crate::value::HapFormat;

/// TLV parameter types carried in PDU bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HapParam {
    /// Characteristic value.
    Value = 0x01,
    /// Additional authorization data.
    AdditionalAuthorizationData = 0x02,
    /// Origin of a write (local or remote).
    Origin = 0x03,
    /// Characteristic type UUID.
    CharacteristicType = 0x04,
    /// Characteristic instance id.
    CharacteristicInstanceId = 0x05,
    /// Service type UUID.
    ServiceType = 0x06,
    /// Service instance id.
    ServiceInstanceId = 0x07,
    /// Time-to-live for a timed write.
    Ttl = 0x08,
    /// Whether a write should return a response body.
    ReturnResponse = 0x09,
    /// HAP characteristic properties bitfield.
    CharacteristicProperties = 0x0A,
    /// GATT user description descriptor.
    UserDescription = 0x0B,
    /// GATT presentation format descriptor.
    PresentationFormat = 0x0C,
    /// GATT valid range (minimum and maximum, in the value format).
    ValidRange = 0x0D,
    /// HAP step value descriptor, in the value format.
    StepValue = 0x0E,
    /// HAP service properties bitfield.
    ServiceProperties = 0x0F,
    /// HAP linked services list.
    LinkedServices = 0x10,
    /// Valid values descriptor.
    ValidValues = 0x11,
    /// Valid values range descriptor.
    ValidValuesRange = 0x12,
}

impl HapParam {
    /// Parameter for a TLV type byte. `None` if unrecognized; unknown
    /// parameters are skipped by the parser for forward compatibility.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::Value),
            0x02 => Some(Self::AdditionalAuthorizationData),
            0x03 => Some(Self::Origin),
            0x04 => Some(Self::CharacteristicType),
            0x05 => Some(Self::CharacteristicInstanceId),
            0x06 => Some(Self::ServiceType),
            0x07 => Some(Self::ServiceInstanceId),
            0x08 => Some(Self::Ttl),
            0x09 => Some(Self::ReturnResponse),
            0x0A => Some(Self::CharacteristicProperties),
            0x0B => Some(Self::UserDescription),
            0x0C => Some(Self::PresentationFormat),
            0x0D => Some(Self::ValidRange),
            0x0E => Some(Self::StepValue),
            0x0F => Some(Self::ServiceProperties),
            0x10 => Some(Self::LinkedServices),
            0x11 => Some(Self::ValidValues),
            0x12 => Some(Self::ValidValuesRange),
            _ => None,
        }
    }

    /// TLV type byte for this parameter.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Canonical parameter name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Value => "Value",
            Self::AdditionalAuthorizationData => "Additional_Authorization_Data",
            Self::Origin => "Origin",
            Self::CharacteristicType => "Characteristic_Type",
            Self::CharacteristicInstanceId => "Characteristic_Instance_ID",
            Self::ServiceType => "Service_Type",
            Self::ServiceInstanceId => "Service_Instance_ID",
            Self::Ttl => "TTL",
            Self::ReturnResponse => "Return_Response",
            Self::CharacteristicProperties => "HAP_Characteristic_Properties_Descriptor",
            Self::UserDescription => "GATT_User_Description_Descriptor",
            Self::PresentationFormat => "GATT_Presentation_Format_Descriptor",
            Self::ValidRange => "GATT_Valid_Range",
            Self::StepValue => "HAP_Step_Value_Descriptor",
            Self::ServiceProperties => "HAP_Service_Properties",
            Self::LinkedServices => "HAP_Linked_Services",
            Self::ValidValues => "HAP_Valid_Values_Descriptor",
            Self::ValidValuesRange => "HAP_Valid_Values_Range_Descriptor",
        }
    }

    /// The parameter's own converter, where it has a fixed one.
    ///
    /// `None` marks the format-dependent parameters (`Value`,
    /// `GATT_Valid_Range`, `HAP_Step_Value_Descriptor`) plus the
    /// presentation format descriptor, all of which the signature parser
    /// treats specially.
    #[must_use]
    pub fn converter(self) -> Option<HapFormat> {
        match self {
            Self::Value | Self::ValidRange | Self::StepValue | Self::PresentationFormat => None,
            Self::Origin | Self::Ttl => Some(HapFormat::U8),
            Self::ReturnResponse => Some(HapFormat::Bool),
            Self::CharacteristicInstanceId
            | Self::ServiceInstanceId
            | Self::CharacteristicProperties
            | Self::ServiceProperties => Some(HapFormat::U16),
            Self::UserDescription => Some(HapFormat::Utf8),
            Self::AdditionalAuthorizationData
            | Self::CharacteristicType
            | Self::ServiceType
            | Self::LinkedServices
            | Self::ValidValues
            | Self::ValidValuesRange => Some(HapFormat::Data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0x01..=0x12u8 {
            let param = HapParam::from_code(code).unwrap();
            assert_eq!(param.code(), code);
        }
        assert_eq!(HapParam::from_code(0x00), None);
        assert_eq!(HapParam::from_code(0x13), None);
    }

    #[test]
    fn format_dependent_params_have_no_fixed_converter() {
        assert_eq!(HapParam::Value.converter(), None);
        assert_eq!(HapParam::ValidRange.converter(), None);
        assert_eq!(HapParam::StepValue.converter(), None);
        assert_eq!(HapParam::PresentationFormat.converter(), None);
        assert_eq!(HapParam::UserDescription.converter(), Some(HapFormat::Utf8));
    }
}
