//! Building blocks for statically typed messages.
//!
//! Code generated from a schema (or written by hand in the same shape)
//! implements [`Message`] for a plain struct and leans on the helpers here
//! for the parts every message shares: the decode loop, unknown-field
//! capture, and required-field checks. The bytes it produces are identical
//! to what [`MessageCodec`](crate::MessageCodec) produces for the same
//! schema.
//!
//! ```
//! use bytes::BufMut;
//! use tagwire_codec::{decode_fields, required, CodecError, FieldOutcome, Message, UnknownFields};
//! use tagwire_wire::{encode_with_tag, encoded_len_with_tag, ScalarType, ScalarValue, WireType};
//!
//! #[derive(Debug, PartialEq)]
//! struct Ping {
//!     seq: u32,
//!     unknown_fields: UnknownFields,
//! }
//!
//! impl Message for Ping {
//!     fn encoded_len(&self) -> usize {
//!         encoded_len_with_tag(1, &ScalarValue::Uint32(self.seq)) + self.unknown_fields.len()
//!     }
//!
//!     fn encode_raw<B: BufMut + ?Sized>(&self, buf: &mut B) {
//!         encode_with_tag(1, &ScalarValue::Uint32(self.seq), buf);
//!         buf.put_slice(&self.unknown_fields);
//!     }
//!
//!     fn decode(data: &[u8]) -> Result<Self, CodecError> {
//!         let mut seq = None;
//!         let unknown_fields = decode_fields(data, |key, reader| {
//!             match (key.tag, key.wire_type) {
//!                 (1, WireType::Varint) => seq = Some(reader.read_varint()? as u32),
//!                 _ => return Ok(FieldOutcome::Unknown),
//!             }
//!             Ok(FieldOutcome::Consumed)
//!         })?;
//!         Ok(Ping { seq: required(seq, "Ping", "seq")?, unknown_fields })
//!     }
//! }
//!
//! let ping = Ping { seq: 150, unknown_fields: UnknownFields::new() };
//! let bytes = ping.encode_to_vec();
//! assert_eq!(bytes, [0x08, 0x96, 0x01]);
//! assert_eq!(Ping::decode(&bytes).unwrap(), ping);
//! ```

use std::cell::Cell;

use bytes::BufMut;
use tagwire_wire::{encode_length_prefix, key_len, length_delimited_len, Key, WireReader};

use crate::{CodecConfig, CodecError, UnknownFields, UnknownFieldsBuilder};

/// A message type with a static Rust representation.
pub trait Message: Sized {
    /// Exact number of bytes [`encode_raw`](Self::encode_raw) writes.
    fn encoded_len(&self) -> usize;

    /// Writes every present field, then the unknown fields.
    fn encode_raw<B: BufMut + ?Sized>(&self, buf: &mut B);

    /// Decodes one instance from exactly `data`.
    fn decode(data: &[u8]) -> Result<Self, CodecError>;

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_raw(&mut buf);
        buf
    }
}

/// What a [`decode_fields`] callback did with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    /// The callback read the payload.
    Consumed,
    /// The callback doesn't know the field and read nothing. It is skipped
    /// and kept as an unknown field.
    Unknown,
}

/// Drives the decode loop for a typed message.
///
/// Reads keys until `data` is exhausted and hands each one to `on_field`
/// together with a reader positioned at the payload. Fields the callback
/// returns [`FieldOutcome::Unknown`] for are skipped and their raw bytes
/// collected, in arrival order, into the returned [`UnknownFields`].
///
/// The first error, from the wire or from the callback, ends decoding.
pub fn decode_fields<'a, F>(data: &'a [u8], mut on_field: F) -> Result<UnknownFields, CodecError>
where
    F: FnMut(Key, &mut WireReader<'a>) -> Result<FieldOutcome, CodecError>,
{
    let mut reader = WireReader::new(data);
    let mut unknown = UnknownFieldsBuilder::new();
    while !reader.is_empty() {
        let start = reader.position();
        let key = reader.read_key()?;
        match on_field(key, &mut reader)? {
            FieldOutcome::Consumed => {}
            FieldOutcome::Unknown => {
                reader.skip_field(key)?;
                unknown.push(reader.consumed_since(start));
            }
        }
    }
    Ok(unknown.finish())
}

/// Unwraps a required field after decoding, or reports it missing.
pub fn required<T>(value: Option<T>, message: &str, field: &str) -> Result<T, CodecError> {
    value.ok_or_else(|| CodecError::MissingRequiredField {
        message: message.to_owned(),
        field: field.to_owned(),
    })
}

/// Bytes taken by a nested message field: key, length prefix, and body.
pub fn message_len_with_tag<M: Message>(tag: u32, msg: &M) -> usize {
    key_len(tag) + length_delimited_len(msg.encoded_len())
}

/// Writes a nested message field: key, length prefix, and body.
pub fn encode_message_with_tag<M: Message, B: BufMut + ?Sized>(tag: u32, msg: &M, buf: &mut B) {
    encode_length_prefix(tag, msg.encoded_len(), buf);
    msg.encode_raw(buf);
}

/// Reads a nested message payload from `reader` and decodes it.
///
/// Nesting depth is counted per thread across calls, so a recursive typed
/// message fails with [`CodecError::RecursionLimitExceeded`] past
/// [`CodecConfig::DEFAULT_RECURSION_LIMIT`] levels instead of exhausting
/// the stack.
pub fn decode_nested<M: Message>(reader: &mut WireReader<'_>) -> Result<M, CodecError> {
    let payload = reader.read_length_delimited()?;
    let _level = NestingLevel::enter::<M>()?;
    M::decode(payload)
}

thread_local! {
    static NESTING: Cell<u32> = const { Cell::new(0) };
}

/// One level of [`decode_nested`]; leaving it restores the count.
struct NestingLevel;

impl NestingLevel {
    fn enter<M>() -> Result<Self, CodecError> {
        let depth = NESTING.with(|n| {
            let depth = n.get() + 1;
            n.set(depth);
            depth
        });
        let level = NestingLevel;
        let limit = CodecConfig::DEFAULT_RECURSION_LIMIT;
        if depth > limit {
            return Err(CodecError::RecursionLimitExceeded {
                message: std::any::type_name::<M>().to_owned(),
                limit,
            });
        }
        Ok(level)
    }
}

impl Drop for NestingLevel {
    fn drop(&mut self) {
        NESTING.with(|n| n.set(n.get() - 1));
    }
}
