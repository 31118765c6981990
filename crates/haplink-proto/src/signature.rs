//! Signature and value-body parsing.
//!
//! The body of a signature-read response describes the characteristic:
//! its value format and unit, valid range, step value and assorted
//! metadata, one TLV parameter each. Value-read responses use the same
//! shape with just a `Value` parameter.
//!
//! Peripherals are free to order the TLVs however they like, including
//! placing format-dependent parameters (`Value`, `GATT_Valid_Range`,
//! `HAP_Step_Value_Descriptor`) before the presentation format descriptor
//! that defines how to decode them. The parser therefore scans the whole
//! stream for the format first and decodes the buffered raw bytes after.

use std::collections::BTreeMap;

use crate::{
    errors::{ProtocolError, Result},
    param::HapParam,
    tlv::coalesce,
    value::{HapFormat, HapUnit, HapValue, PresentationFormat},
};

/// Parsed description of a characteristic.
///
/// Every field is optional: a signature carries whatever subset the
/// peripheral chose to expose, and a value read yields only `value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacteristicDescriptor {
    /// Declared value format, when the body carried a presentation format.
    pub format: Option<HapFormat>,
    /// Declared unit.
    pub unit: Option<HapUnit>,
    /// Lower bound of the valid range, in the value format.
    pub min_value: Option<HapValue>,
    /// Upper bound of the valid range, in the value format.
    pub max_value: Option<HapValue>,
    /// Step value, in the value format.
    pub step_value: Option<HapValue>,
    /// Characteristic value (value reads and write responses).
    pub value: Option<HapValue>,
    /// Remaining recognized parameters, keyed by lowercase canonical name.
    pub other: BTreeMap<String, HapValue>,
}

impl CharacteristicDescriptor {
    /// Converter for this characteristic's values, when the signature
    /// declared one.
    #[must_use]
    pub fn converter(&self) -> Option<HapFormat> {
        self.format
    }
}

/// Parse the body of a signature-read or value-read response.
///
/// `format_override` supplies the converter learned from an earlier
/// signature read; it wins over a format declared in this body. With
/// neither, format-dependent values fall back to the identity conversion
/// and come back as [`HapValue::Data`].
///
/// Unknown parameter types are skipped for forward compatibility.
///
/// # Errors
///
/// Any TLV-stream fault, an invalid presentation format descriptor, an
/// odd-length valid range, or a value that does not decode in the
/// established format.
pub fn parse_signature(
    body: &[u8],
    format_override: Option<HapFormat>,
) -> Result<CharacteristicDescriptor> {
    let items = coalesce(body)?;

    // First pass: the presentation format establishes the value converter.
    let mut format = None;
    let mut unit = None;
    for item in &items {
        if HapParam::from_code(item.kind) == Some(HapParam::PresentationFormat) {
            let descriptor = PresentationFormat::parse(&item.value)?;
            format = Some(descriptor.format);
            unit = Some(descriptor.unit);
        }
    }

    let converter = format_override.or(format).unwrap_or(HapFormat::Data);
    let mut parsed = CharacteristicDescriptor { format, unit, ..Default::default() };

    for item in &items {
        let Some(param) = HapParam::from_code(item.kind) else {
            continue;
        };

        match param {
            HapParam::PresentationFormat => {},
            HapParam::ValidRange => {
                if item.value.len() % 2 != 0 {
                    return Err(ProtocolError::ValidRangeLength { actual: item.value.len() });
                }
                let (low, high) = item.value.split_at(item.value.len() / 2);
                parsed.min_value = Some(converter.decode(low)?);
                parsed.max_value = Some(converter.decode(high)?);
            },
            HapParam::StepValue => parsed.step_value = Some(converter.decode(&item.value)?),
            HapParam::Value => parsed.value = Some(converter.decode(&item.value)?),
            param => {
                let Some(fixed) = param.converter() else {
                    continue;
                };
                let value = fixed.decode(&item.value)?;
                parsed.other.insert(param.name().to_ascii_lowercase(), value);
            },
        }
    }

    Ok(parsed)
}
