//! Scalar types and their codecs.
//!
//! This is the fixed mapping from a field's semantic type to the way it is
//! laid out on the wire. It is exhaustive: every scalar type has exactly
//! one wire type and exactly one way to size, write, and read it.
//!
//! | Scalar | Wire type | Notes |
//! |---|---|---|
//! | `bool`, `int32`, `int64`, `uint32`, `uint64` | varint | negative `int32`/`int64` take 10 bytes |
//! | `sint32`, `sint64` | varint | zig-zag |
//! | `fixed32`, `sfixed32`, `float` | fixed32 | little-endian |
//! | `fixed64`, `sfixed64`, `double` | fixed64 | little-endian |
//! | `string`, `bytes` | length-delimited | varint length prefix |
//!
//! Enums use the `int32` encoding and nested messages are length-delimited;
//! both are handled a layer up because they need the schema.

use std::fmt;

use bytes::{BufMut, Bytes};
use serde::{Deserialize, Serialize};

use crate::varint::{
    encode_varint, encoded_len_varint, zigzag_decode32, zigzag_decode64, zigzag_encode32,
    zigzag_encode64,
};
use crate::wire_type::key_len;
use crate::{Key, WireError, WireReader, WireType};

// ---------------------------------------------------------------------------
// ScalarType
// ---------------------------------------------------------------------------

/// The built-in field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Float,
    Double,
    String,
    Bytes,
}

impl ScalarType {
    /// The wire category values of this type are written with.
    pub fn wire_type(self) -> WireType {
        match self {
            Self::Bool
            | Self::Int32
            | Self::Int64
            | Self::Uint32
            | Self::Uint64
            | Self::Sint32
            | Self::Sint64 => WireType::Varint,
            Self::Fixed32 | Self::Sfixed32 | Self::Float => WireType::Fixed32,
            Self::Fixed64 | Self::Sfixed64 | Self::Double => WireType::Fixed64,
            Self::String | Self::Bytes => WireType::LengthDelimited,
        }
    }

    /// Reads one payload of this type. The key has already been consumed.
    pub fn read(self, reader: &mut WireReader<'_>) -> Result<ScalarValue, WireError> {
        Ok(match self {
            Self::Bool => ScalarValue::Bool(reader.read_varint()? != 0),
            // Truncation is the defined behavior for 32-bit varints.
            Self::Int32 => ScalarValue::Int32(reader.read_varint()? as i32),
            Self::Int64 => ScalarValue::Int64(reader.read_varint()? as i64),
            Self::Uint32 => ScalarValue::Uint32(reader.read_varint()? as u32),
            Self::Uint64 => ScalarValue::Uint64(reader.read_varint()?),
            Self::Sint32 => ScalarValue::Sint32(zigzag_decode32(reader.read_varint()? as u32)),
            Self::Sint64 => ScalarValue::Sint64(zigzag_decode64(reader.read_varint()?)),
            Self::Fixed32 => ScalarValue::Fixed32(reader.read_fixed32()?),
            Self::Fixed64 => ScalarValue::Fixed64(reader.read_fixed64()?),
            Self::Sfixed32 => ScalarValue::Sfixed32(reader.read_fixed32()? as i32),
            Self::Sfixed64 => ScalarValue::Sfixed64(reader.read_fixed64()? as i64),
            Self::Float => ScalarValue::Float(f32::from_bits(reader.read_fixed32()?)),
            Self::Double => ScalarValue::Double(f64::from_bits(reader.read_fixed64()?)),
            Self::String => {
                let raw = reader.read_length_delimited()?;
                let s = std::str::from_utf8(raw).map_err(|_| WireError::InvalidUtf8)?;
                ScalarValue::String(s.to_owned())
            }
            Self::Bytes => ScalarValue::Bytes(Bytes::copy_from_slice(reader.read_length_delimited()?)),
        })
    }

    /// The value an unset field of this type reads as.
    pub fn zero_value(self) -> ScalarValue {
        match self {
            Self::Bool => ScalarValue::Bool(false),
            Self::Int32 => ScalarValue::Int32(0),
            Self::Int64 => ScalarValue::Int64(0),
            Self::Uint32 => ScalarValue::Uint32(0),
            Self::Uint64 => ScalarValue::Uint64(0),
            Self::Sint32 => ScalarValue::Sint32(0),
            Self::Sint64 => ScalarValue::Sint64(0),
            Self::Fixed32 => ScalarValue::Fixed32(0),
            Self::Fixed64 => ScalarValue::Fixed64(0),
            Self::Sfixed32 => ScalarValue::Sfixed32(0),
            Self::Sfixed64 => ScalarValue::Sfixed64(0),
            Self::Float => ScalarValue::Float(0.0),
            Self::Double => ScalarValue::Double(0.0),
            Self::String => ScalarValue::String(String::new()),
            Self::Bytes => ScalarValue::Bytes(Bytes::new()),
        }
    }

    /// Parses a textual default (as written in a schema) into a value of
    /// this type. Returns `None` if the text doesn't fit the type.
    ///
    /// `bytes` defaults are taken as the literal UTF-8 bytes of the text.
    pub fn parse_default(self, raw: &str) -> Option<ScalarValue> {
        let text = raw.trim();
        Some(match self {
            Self::Bool => ScalarValue::Bool(text.parse().ok()?),
            Self::Int32 => ScalarValue::Int32(text.parse().ok()?),
            Self::Int64 => ScalarValue::Int64(text.parse().ok()?),
            Self::Uint32 => ScalarValue::Uint32(text.parse().ok()?),
            Self::Uint64 => ScalarValue::Uint64(text.parse().ok()?),
            Self::Sint32 => ScalarValue::Sint32(text.parse().ok()?),
            Self::Sint64 => ScalarValue::Sint64(text.parse().ok()?),
            Self::Fixed32 => ScalarValue::Fixed32(text.parse().ok()?),
            Self::Fixed64 => ScalarValue::Fixed64(text.parse().ok()?),
            Self::Sfixed32 => ScalarValue::Sfixed32(text.parse().ok()?),
            Self::Sfixed64 => ScalarValue::Sfixed64(text.parse().ok()?),
            Self::Float => ScalarValue::Float(parse_float(text)? as f32),
            Self::Double => ScalarValue::Double(parse_float(text)?),
            Self::String => ScalarValue::String(raw.to_owned()),
            Self::Bytes => ScalarValue::Bytes(Bytes::copy_from_slice(raw.as_bytes())),
        })
    }
}

/// Accepts the schema spellings `inf`, `-inf` and `nan` on top of what
/// `f64::from_str` takes.
fn parse_float(text: &str) -> Option<f64> {
    match text {
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        "nan" => Some(f64::NAN),
        _ => text.parse().ok(),
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// ScalarValue
// ---------------------------------------------------------------------------

/// A scalar value tagged with its schema type.
///
/// There is one variant per [`ScalarType`], so a value always knows how it
/// is encoded: `Sint32(-1)` and `Int32(-1)` hold the same number but take
/// 1 and 10 bytes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Sint32(i32),
    Sint64(i64),
    Fixed32(u32),
    Fixed64(u64),
    Sfixed32(i32),
    Sfixed64(i64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Bytes),
}

impl ScalarValue {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Bool(_) => ScalarType::Bool,
            Self::Int32(_) => ScalarType::Int32,
            Self::Int64(_) => ScalarType::Int64,
            Self::Uint32(_) => ScalarType::Uint32,
            Self::Uint64(_) => ScalarType::Uint64,
            Self::Sint32(_) => ScalarType::Sint32,
            Self::Sint64(_) => ScalarType::Sint64,
            Self::Fixed32(_) => ScalarType::Fixed32,
            Self::Fixed64(_) => ScalarType::Fixed64,
            Self::Sfixed32(_) => ScalarType::Sfixed32,
            Self::Sfixed64(_) => ScalarType::Sfixed64,
            Self::Float(_) => ScalarType::Float,
            Self::Double(_) => ScalarType::Double,
            Self::String(_) => ScalarType::String,
            Self::Bytes(_) => ScalarType::Bytes,
        }
    }

    pub fn wire_type(&self) -> WireType {
        self.scalar_type().wire_type()
    }

    /// Payload size in bytes, not counting the key. Length-delimited values
    /// include their length prefix.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Bool(_) => 1,
            Self::Int32(n) => encoded_len_varint(i64::from(*n) as u64),
            Self::Int64(n) => encoded_len_varint(*n as u64),
            Self::Uint32(n) => encoded_len_varint(u64::from(*n)),
            Self::Uint64(n) => encoded_len_varint(*n),
            Self::Sint32(n) => encoded_len_varint(u64::from(zigzag_encode32(*n))),
            Self::Sint64(n) => encoded_len_varint(zigzag_encode64(*n)),
            Self::Fixed32(_) | Self::Sfixed32(_) | Self::Float(_) => 4,
            Self::Fixed64(_) | Self::Sfixed64(_) | Self::Double(_) => 8,
            Self::String(s) => length_delimited_len(s.len()),
            Self::Bytes(b) => length_delimited_len(b.len()),
        }
    }

    /// Writes the payload (no key).
    pub fn encode<B: BufMut + ?Sized>(&self, buf: &mut B) {
        match self {
            Self::Bool(b) => buf.put_u8(u8::from(*b)),
            // Negative int32 is sign-extended to 64 bits, per the wire format.
            Self::Int32(n) => encode_varint(i64::from(*n) as u64, buf),
            Self::Int64(n) => encode_varint(*n as u64, buf),
            Self::Uint32(n) => encode_varint(u64::from(*n), buf),
            Self::Uint64(n) => encode_varint(*n, buf),
            Self::Sint32(n) => encode_varint(u64::from(zigzag_encode32(*n)), buf),
            Self::Sint64(n) => encode_varint(zigzag_encode64(*n), buf),
            Self::Fixed32(n) => buf.put_u32_le(*n),
            Self::Fixed64(n) => buf.put_u64_le(*n),
            Self::Sfixed32(n) => buf.put_i32_le(*n),
            Self::Sfixed64(n) => buf.put_i64_le(*n),
            Self::Float(n) => buf.put_f32_le(*n),
            Self::Double(n) => buf.put_f64_le(*n),
            Self::String(s) => {
                encode_varint(s.len() as u64, buf);
                buf.put_slice(s.as_bytes());
            }
            Self::Bytes(b) => {
                encode_varint(b.len() as u64, buf);
                buf.put_slice(b);
            }
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// Field-level helpers
// ---------------------------------------------------------------------------

/// Size of a length-delimited payload of `len` bytes, prefix included.
pub fn length_delimited_len(len: usize) -> usize {
    encoded_len_varint(len as u64) + len
}

/// Size of `value` written as field `tag`: key plus payload.
pub fn encoded_len_with_tag(tag: u32, value: &ScalarValue) -> usize {
    key_len(tag) + value.encoded_len()
}

/// Writes `value` as field `tag`.
pub fn encode_with_tag<B: BufMut + ?Sized>(tag: u32, value: &ScalarValue, buf: &mut B) {
    Key::new(tag, value.wire_type()).encode(buf);
    value.encode(buf);
}

/// Writes the key and length prefix of a length-delimited field whose
/// `len`-byte body the caller writes next. Used for nested messages.
pub fn encode_length_prefix<B: BufMut + ?Sized>(tag: u32, len: usize, buf: &mut B) {
    Key::new(tag, WireType::LengthDelimited).encode(buf);
    encode_varint(len as u64, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: &ScalarValue) -> Vec<u8> {
        let mut out = Vec::new();
        value.encode(&mut out);
        out
    }

    fn read_back(ty: ScalarType, bytes: &[u8]) -> ScalarValue {
        let mut r = WireReader::new(bytes);
        let v = ty.read(&mut r).unwrap();
        assert!(r.is_empty(), "{ty} left {} byte(s) unread", r.remaining());
        v
    }

    #[test]
    fn test_wire_type_mapping_is_exhaustive() {
        use ScalarType::*;
        for ty in [Bool, Int32, Int64, Uint32, Uint64, Sint32, Sint64] {
            assert_eq!(ty.wire_type(), WireType::Varint, "{ty}");
        }
        for ty in [Fixed32, Sfixed32, Float] {
            assert_eq!(ty.wire_type(), WireType::Fixed32, "{ty}");
        }
        for ty in [Fixed64, Sfixed64, Double] {
            assert_eq!(ty.wire_type(), WireType::Fixed64, "{ty}");
        }
        for ty in [String, Bytes] {
            assert_eq!(ty.wire_type(), WireType::LengthDelimited, "{ty}");
        }
    }

    #[test]
    fn test_negative_int32_takes_ten_bytes() {
        let v = ScalarValue::Int32(-1);
        let bytes = encoded(&v);
        assert_eq!(bytes.len(), 10);
        assert_eq!(v.encoded_len(), 10);
        assert_eq!(read_back(ScalarType::Int32, &bytes), v);
    }

    #[test]
    fn test_sint32_minus_one_takes_one_byte() {
        let v = ScalarValue::Sint32(-1);
        assert_eq!(encoded(&v), vec![0x01]);
        assert_eq!(read_back(ScalarType::Sint32, &[0x01]), v);
    }

    #[test]
    fn test_fixed_and_float_layouts() {
        assert_eq!(encoded(&ScalarValue::Fixed32(1)), vec![1, 0, 0, 0]);
        assert_eq!(encoded(&ScalarValue::Sfixed64(-1)), vec![0xff; 8]);
        assert_eq!(encoded(&ScalarValue::Float(1.0)), 1.0f32.to_le_bytes().to_vec());
        assert_eq!(
            read_back(ScalarType::Double, &2.5f64.to_le_bytes()),
            ScalarValue::Double(2.5)
        );
    }

    #[test]
    fn test_string_is_length_prefixed() {
        let v = ScalarValue::from("hi");
        assert_eq!(encoded(&v), vec![0x02, b'h', b'i']);
        assert_eq!(v.encoded_len(), 3);
        assert_eq!(read_back(ScalarType::String, &[0x02, b'h', b'i']), v);
    }

    #[test]
    fn test_invalid_utf8_string_is_rejected() {
        let mut r = WireReader::new(&[0x02, 0xff, 0xfe]);
        assert_eq!(ScalarType::String.read(&mut r), Err(WireError::InvalidUtf8));
    }

    #[test]
    fn test_bool_reads_any_nonzero_as_true() {
        assert_eq!(read_back(ScalarType::Bool, &[0x02]), ScalarValue::Bool(true));
        assert_eq!(read_back(ScalarType::Bool, &[0x00]), ScalarValue::Bool(false));
    }

    #[test]
    fn test_uint32_truncates_wide_varint() {
        let mut bytes = Vec::new();
        encode_varint(0x1_0000_0005, &mut bytes);
        assert_eq!(read_back(ScalarType::Uint32, &bytes), ScalarValue::Uint32(5));
    }

    #[test]
    fn test_encode_with_tag_writes_key_first() {
        let mut out = Vec::new();
        encode_with_tag(2, &ScalarValue::Int32(1), &mut out);
        assert_eq!(out, vec![0x10, 0x01]);
        assert_eq!(encoded_len_with_tag(2, &ScalarValue::Int32(1)), 2);
    }

    #[test]
    fn test_encode_length_prefix() {
        let mut out = Vec::new();
        encode_length_prefix(4, 300, &mut out);
        assert_eq!(out, vec![0x22, 0xac, 0x02]);
    }

    #[test]
    fn test_parse_default_by_type() {
        assert_eq!(ScalarType::Int32.parse_default("-7"), Some(ScalarValue::Int32(-7)));
        assert_eq!(ScalarType::Bool.parse_default("true"), Some(ScalarValue::Bool(true)));
        assert_eq!(
            ScalarType::Double.parse_default("-inf"),
            Some(ScalarValue::Double(f64::NEG_INFINITY))
        );
        assert_eq!(ScalarType::Uint32.parse_default("-1"), None);
        assert_eq!(ScalarType::Int32.parse_default("abc"), None);
        assert_eq!(
            ScalarType::String.parse_default("hello"),
            Some(ScalarValue::from("hello"))
        );
    }

    #[test]
    fn test_zero_values_encode_minimally() {
        assert_eq!(ScalarType::Int64.zero_value().encoded_len(), 1);
        assert_eq!(ScalarType::String.zero_value().encoded_len(), 1);
        assert_eq!(ScalarType::Double.zero_value().encoded_len(), 8);
    }

    #[test]
    fn test_scalar_type_serializes_snake_case() {
        let json = serde_json::to_string(&ScalarType::Sfixed32).unwrap();
        assert_eq!(json, "\"sfixed32\"");
        let ty: ScalarType = serde_json::from_str("\"uint64\"").unwrap();
        assert_eq!(ty, ScalarType::Uint64);
    }
}
