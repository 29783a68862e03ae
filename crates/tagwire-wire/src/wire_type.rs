//! Wire types and field keys.
//!
//! Every field on the wire starts with a key: a varint holding the field's
//! tag in the upper bits and its wire type in the low three bits.
//!
//! ```text
//! key = (tag << 3) | wire_type
//! ```
//!
//! The wire type tells a reader how to find the end of the payload, which
//! is what lets an old reader skip fields it has never heard of.

use std::fmt;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::varint::{encode_varint, encoded_len_varint};
use crate::WireError;

/// Smallest legal field tag.
pub const MIN_TAG: u32 = 1;

/// Largest legal field tag (29 bits; the key needs 3 bits for the wire type).
pub const MAX_TAG: u32 = (1 << 29) - 1;

// ---------------------------------------------------------------------------
// WireType
// ---------------------------------------------------------------------------

/// How a payload is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireType {
    /// Base-128 varint: integers, booleans, enums.
    Varint = 0,
    /// Eight little-endian bytes.
    Fixed64 = 1,
    /// Varint length followed by that many bytes: strings, bytes, messages.
    LengthDelimited = 2,
    /// Legacy group start. Only ever skipped, never produced.
    StartGroup = 3,
    /// Legacy group end.
    EndGroup = 4,
    /// Four little-endian bytes.
    Fixed32 = 5,
}

impl WireType {
    /// Converts the low three bits of a key.
    pub fn from_bits(bits: u8) -> Result<Self, WireError> {
        match bits {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            3 => Ok(Self::StartGroup),
            4 => Ok(Self::EndGroup),
            5 => Ok(Self::Fixed32),
            other => Err(WireError::InvalidWireType(other)),
        }
    }

    /// Returns `true` if several values of this wire type may be packed into
    /// one length-delimited payload.
    pub fn is_packable(self) -> bool {
        matches!(self, Self::Varint | Self::Fixed32 | Self::Fixed64)
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Varint => write!(f, "varint"),
            Self::Fixed64 => write!(f, "fixed64"),
            Self::LengthDelimited => write!(f, "length-delimited"),
            Self::StartGroup => write!(f, "start-group"),
            Self::EndGroup => write!(f, "end-group"),
            Self::Fixed32 => write!(f, "fixed32"),
        }
    }
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// A decoded field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub tag: u32,
    pub wire_type: WireType,
}

impl Key {
    pub fn new(tag: u32, wire_type: WireType) -> Self {
        Self { tag, wire_type }
    }

    /// The raw varint value of this key.
    pub fn to_raw(self) -> u64 {
        (u64::from(self.tag) << 3) | self.wire_type as u64
    }

    /// Splits a raw key varint into tag and wire type.
    ///
    /// # Errors
    /// [`WireError::InvalidTag`] for tag 0 or tags beyond [`MAX_TAG`],
    /// [`WireError::InvalidWireType`] for wire types 6 and 7.
    pub fn from_raw(raw: u64) -> Result<Self, WireError> {
        let wire_type = WireType::from_bits((raw & 0x07) as u8)?;
        let tag = raw >> 3;
        if tag < u64::from(MIN_TAG) || tag > u64::from(MAX_TAG) {
            return Err(WireError::InvalidTag(tag));
        }
        Ok(Self {
            tag: tag as u32,
            wire_type,
        })
    }

    /// Number of bytes this key occupies on the wire.
    pub fn encoded_len(self) -> usize {
        encoded_len_varint(self.to_raw())
    }

    /// Writes this key as a varint.
    pub fn encode<B: BufMut + ?Sized>(self, buf: &mut B) {
        encode_varint(self.to_raw(), buf);
    }
}

/// Bytes taken by the key for `tag`. The wire type never changes the
/// length, since it only occupies the low three bits.
pub fn key_len(tag: u32) -> usize {
    encoded_len_varint(u64::from(tag) << 3)
}
