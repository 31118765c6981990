//! HAP value formats, units and decoded values.
//!
//! The format tables follow the GATT characteristic presentation format
//! codes that HAP reuses; all multi-byte integers are little-endian on the
//! wire.

use crate::errors::{ProtocolError, Result};

/// Value formats a characteristic can declare.
///
/// Each format doubles as its own converter: [`HapFormat::decode`] turns
/// raw value bytes into a [`HapValue`]. [`HapFormat::Data`] is the identity
/// conversion used before a signature has established a real format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HapFormat {
    /// Boolean, one byte.
    Bool,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 32-bit integer.
    I32,
    /// IEEE-754 single-precision float.
    F32,
    /// UTF-8 string.
    Utf8,
    /// Nested TLV8 structure, kept opaque.
    Tlv8,
    /// Raw bytes.
    Data,
}

impl HapFormat {
    /// Format for a GATT presentation format code. `None` if unrecognized.
    #[must_use]
    pub fn from_gatt_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::Bool),
            0x04 => Some(Self::U8),
            0x06 => Some(Self::U16),
            0x08 => Some(Self::U32),
            0x0A => Some(Self::U64),
            0x10 => Some(Self::I32),
            0x14 => Some(Self::F32),
            0x19 => Some(Self::Utf8),
            0x1B => Some(Self::Tlv8),
            _ => None,
        }
    }

    /// GATT presentation format code for this format.
    ///
    /// `Data` shares the opaque-structure code with `Tlv8`;
    /// [`HapFormat::from_gatt_code`] resolves that code to `Tlv8`.
    #[must_use]
    pub fn gatt_code(self) -> u8 {
        match self {
            Self::Bool => 0x01,
            Self::U8 => 0x04,
            Self::U16 => 0x06,
            Self::U32 => 0x08,
            Self::U64 => 0x0A,
            Self::I32 => 0x10,
            Self::F32 => 0x14,
            Self::Utf8 => 0x19,
            Self::Tlv8 | Self::Data => 0x1B,
        }
    }

    /// Canonical format name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::I32 => "int",
            Self::F32 => "float",
            Self::Utf8 => "string",
            Self::Tlv8 => "tlv8",
            Self::Data => "data",
        }
    }

    /// Decode raw value bytes into a domain value.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::ValueLength` when `bytes` does not match the
    ///   format's width
    /// - `ProtocolError::InvalidUtf8` for non-UTF-8 string values
    pub fn decode(self, bytes: &[u8]) -> Result<HapValue> {
        match self {
            Self::Bool => {
                let [byte] = fixed::<1>(self.name(), bytes)?;
                Ok(HapValue::Bool(byte != 0))
            },
            Self::U8 => {
                let [byte] = fixed::<1>(self.name(), bytes)?;
                Ok(HapValue::U8(byte))
            },
            Self::U16 => Ok(HapValue::U16(u16::from_le_bytes(fixed(self.name(), bytes)?))),
            Self::U32 => Ok(HapValue::U32(u32::from_le_bytes(fixed(self.name(), bytes)?))),
            Self::U64 => Ok(HapValue::U64(u64::from_le_bytes(fixed(self.name(), bytes)?))),
            Self::I32 => Ok(HapValue::I32(i32::from_le_bytes(fixed(self.name(), bytes)?))),
            Self::F32 => Ok(HapValue::F32(f32::from_le_bytes(fixed(self.name(), bytes)?))),
            Self::Utf8 => {
                let text =
                    std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?;
                Ok(HapValue::Str(text.to_owned()))
            },
            Self::Tlv8 => Ok(HapValue::Tlv8(bytes.to_vec())),
            Self::Data => Ok(HapValue::Data(bytes.to_vec())),
        }
    }
}

/// Copy `bytes` into an `N`-byte array, or report the width mismatch.
fn fixed<const N: usize>(format: &'static str, bytes: &[u8]) -> Result<[u8; N]> {
    <[u8; N]>::try_from(bytes).map_err(|_| ProtocolError::ValueLength {
        format,
        expected: N,
        actual: bytes.len(),
    })
}

/// Units a characteristic can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HapUnit {
    /// Degrees Celsius.
    Celsius,
    /// Degrees of arc.
    ArcDegrees,
    /// Percentage.
    Percentage,
    /// Illuminance in lux.
    Lux,
    /// Seconds.
    Seconds,
    /// No unit.
    Unitless,
}

impl HapUnit {
    /// Unit for a 16-bit GATT unit code. `None` if unrecognized.
    #[must_use]
    pub fn from_gatt_code(code: u16) -> Option<Self> {
        match code {
            0x272F => Some(Self::Celsius),
            0x2763 => Some(Self::ArcDegrees),
            0x27AD => Some(Self::Percentage),
            0x2731 => Some(Self::Lux),
            0x2703 => Some(Self::Seconds),
            0x2700 => Some(Self::Unitless),
            _ => None,
        }
    }

    /// GATT unit code for this unit.
    #[must_use]
    pub fn gatt_code(self) -> u16 {
        match self {
            Self::Celsius => 0x272F,
            Self::ArcDegrees => 0x2763,
            Self::Percentage => 0x27AD,
            Self::Lux => 0x2731,
            Self::Seconds => 0x2703,
            Self::Unitless => 0x2700,
        }
    }

    /// Canonical unit name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::ArcDegrees => "arcdegrees",
            Self::Percentage => "percentage",
            Self::Lux => "lux",
            Self::Seconds => "seconds",
            Self::Unitless => "unitless",
        }
    }
}

/// A decoded characteristic value.
#[derive(Debug, Clone, PartialEq)]
pub enum HapValue {
    /// Boolean.
    Bool(bool),
    /// Unsigned 8-bit integer.
    U8(u8),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Signed 32-bit integer.
    I32(i32),
    /// Single-precision float.
    F32(f32),
    /// UTF-8 string.
    Str(String),
    /// Opaque TLV8 structure.
    Tlv8(Vec<u8>),
    /// Raw bytes.
    Data(Vec<u8>),
}

/// Parsed 7-byte GATT characteristic presentation format descriptor.
///
/// Wire layout: `[format, exponent, unit_lo, unit_hi, namespace, desc_lo,
/// desc_hi]`. Only the format and unit matter to HAP; the rest is carried
/// but ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationFormat {
    /// Declared value format.
    pub format: HapFormat,
    /// Declared unit.
    pub unit: HapUnit,
}

impl PresentationFormat {
    /// Serialized size of the descriptor.
    pub const SIZE: usize = 7;

    /// Parse the descriptor value bytes.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PresentationFormatLength` when not exactly 7 bytes
    /// - `ProtocolError::UnknownFormatCode` / `UnknownUnitCode` when a code
    ///   is not in its table
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(ProtocolError::PresentationFormatLength { actual: bytes.len() });
        }

        let format = HapFormat::from_gatt_code(bytes[0])
            .ok_or(ProtocolError::UnknownFormatCode(bytes[0]))?;

        let unit_code = u16::from_le_bytes([bytes[2], bytes[3]]);
        let unit =
            HapUnit::from_gatt_code(unit_code).ok_or(ProtocolError::UnknownUnitCode(unit_code))?;

        Ok(Self { format, unit })
    }

    /// Wire form with a zero exponent, the Bluetooth SIG namespace and no
    /// description (what fake peripherals and tests emit).
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let unit = self.unit.gatt_code().to_le_bytes();
        [self.format.gatt_code(), 0x00, unit[0], unit[1], 0x01, 0x00, 0x00]
    }
}
