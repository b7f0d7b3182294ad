//! Wire type model
//!
//! Each encoded field starts with a varint key packing the field tag and a
//! 3-bit wire type discriminant: `key = tag << 3 | wire_type`. The wire type
//! tells a decoder how to measure a payload it does not recognize, which is
//! what makes unknown-tag skipping (and so schema evolution) possible.
//!
//! ## Wire Type Values
//!
//! | Discriminant | Wire type | Payload |
//! |--------------|-----------|---------|
//! | 0 | Varint | one varint |
//! | 1 | Fixed64 | eight bytes, little-endian |
//! | 2 | LengthDelimited | varint length, then raw bytes |

use tagpack_core::error::{Error, Result};
use tagpack_core::schema::FieldType;

/// Coarse encoding category recorded per field on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    /// Single varint payload (integers, booleans, enums)
    Varint = 0,
    /// Eight-byte little-endian payload (floats)
    Fixed64 = 1,
    /// Varint length prefix followed by raw bytes (strings, bytes, nested
    /// messages)
    LengthDelimited = 2,
}

impl WireType {
    /// Decode a wire type discriminant
    pub fn from_discriminant(d: u8) -> Option<WireType> {
        match d {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            _ => None,
        }
    }

    /// Human-readable name, used in error messages
    pub const fn name(&self) -> &'static str {
        match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length-delimited",
        }
    }
}

/// The wire type a field type encodes with
///
/// Repeated fields emit one key per element, so the element type decides.
pub fn wire_type_of(ty: &FieldType) -> WireType {
    match ty {
        FieldType::Int | FieldType::UInt | FieldType::Bool | FieldType::Enum(_) => {
            WireType::Varint
        }
        FieldType::Float => WireType::Fixed64,
        FieldType::String | FieldType::Bytes | FieldType::Message(_) => {
            WireType::LengthDelimited
        }
    }
}

/// Pack a field tag and wire type into an encoded key
pub fn field_key(tag: u32, wire: WireType) -> u64 {
    ((tag as u64) << 3) | wire as u64
}

/// Split an encoded key into tag and wire type
///
/// Fails with `CorruptData` on a zero tag or an undefined wire type
/// discriminant; `offset` locates the key in the input for the error message.
pub fn split_key(key: u64, offset: usize) -> Result<(u32, WireType)> {
    let tag = key >> 3;
    if tag == 0 {
        return Err(Error::CorruptData(format!(
            "field key with tag 0 at offset {}",
            offset
        )));
    }
    if tag > u32::MAX as u64 {
        return Err(Error::CorruptData(format!(
            "field tag {} out of range at offset {}",
            tag, offset
        )));
    }
    let wire = WireType::from_discriminant((key & 0x7) as u8).ok_or_else(|| {
        Error::CorruptData(format!(
            "undefined wire type {} at offset {}",
            key & 0x7,
            offset
        ))
    })?;
    Ok((tag as u32, wire))
}
