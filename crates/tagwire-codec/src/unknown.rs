//! Unknown-field preservation.
//!
//! Fields a schema doesn't know about are kept as raw bytes, key and payload
//! together, in arrival order. Encode writes them back verbatim after the
//! known fields, so a message survives a trip through a reader built from
//! an older schema.

use std::ops::Deref;

use bytes::{Bytes, BytesMut};
use tagwire_wire::{encode_varint, Key, WireType};

/// The frozen unknown-field bytes of one message instance.
///
/// The contents are opaque: a concatenation of complete, well-formed fields
/// that are never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownFields(Bytes);

impl UnknownFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }
}

impl Deref for UnknownFields {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for UnknownFields {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for UnknownFields {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

/// Collects unknown fields while a message is being decoded.
///
/// Starts empty and allocates on the first push, so messages without
/// unknown fields pay nothing.
#[derive(Debug, Default)]
pub struct UnknownFieldsBuilder {
    buf: BytesMut,
}

impl UnknownFieldsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one complete field (key and payload) exactly as read.
    pub fn push(&mut self, raw: &[u8]) {
        self.buf.extend_from_slice(raw);
    }

    /// Appends a varint field built from its parts.
    ///
    /// Used where the original bytes aren't available as one slice, such
    /// as a single element pulled out of a packed run.
    pub fn push_varint(&mut self, tag: u32, value: u64) {
        Key::new(tag, WireType::Varint).encode(&mut self.buf);
        encode_varint(value, &mut self.buf);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> UnknownFields {
        UnknownFields(self.buf.freeze())
    }
}
