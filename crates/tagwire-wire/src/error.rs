//! Error types for the wire layer.
//!
//! Everything in here means the same thing to a caller: the byte stream
//! is not a well-formed sequence of `(key, payload)` pairs. Higher layers
//! wrap this as their "malformed wire" error kind.

/// Errors that can occur while reading the raw wire format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The stream ended in the middle of a key, varint, fixed-width value,
    /// or length-delimited payload.
    #[error("unexpected end of input: needed {needed} more byte(s)")]
    UnexpectedEof { needed: usize },

    /// A varint ran longer than 10 bytes, or its tenth byte carried bits
    /// that don't fit in 64 bits.
    #[error("varint overflows 64 bits")]
    VarintOverflow,

    /// A key decoded to tag 0, or to a tag above the 29-bit maximum.
    #[error("invalid field tag {0}")]
    InvalidTag(u64),

    /// The low three bits of a key named a wire type that doesn't exist
    /// (6 or 7).
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),

    /// A length prefix is larger than the address space can represent.
    #[error("length prefix {0} is too large")]
    LengthOverflow(u64),

    /// A `string` payload was not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    /// An end-group key appeared without a matching start-group key.
    #[error("end-group for tag {0} without a matching start-group")]
    UnexpectedEndGroup(u32),

    /// The stream ended inside a group.
    #[error("group with tag {0} is never closed")]
    UnterminatedGroup(u32),

    /// Groups nested deeper than the reader is willing to follow.
    #[error("groups nested more than {0} deep")]
    GroupDepthExceeded(usize),
}
