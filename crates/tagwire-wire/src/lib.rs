//! Wire primitives for tagwire.
//!
//! This crate knows how bytes are laid out, and nothing about schemas:
//!
//! - **Varints** ([`encode_varint`], [`decode_varint`]) and zig-zag mapping.
//! - **Keys** ([`Key`], [`WireType`]): `(tag << 3) | wire_type`.
//! - **Scalars** ([`ScalarType`], [`ScalarValue`]): the fixed mapping from a
//!   semantic type to its wire type and codec.
//! - **Reading** ([`WireReader`]): a bounds-checked cursor that can also
//!   skip any field, which is how unknown fields are preserved.
//!
//! ```text
//! Codec (messages) → Schema (plans) → Wire (this crate: bytes)
//! ```

mod error;
mod reader;
mod scalar;
mod varint;
mod wire_type;

pub use error::WireError;
pub use reader::{WireReader, MAX_GROUP_DEPTH};
pub use scalar::{
    encode_length_prefix, encode_with_tag, encoded_len_with_tag, length_delimited_len,
    ScalarType, ScalarValue,
};
pub use varint::{
    decode_varint, encode_varint, encoded_len_varint, zigzag_decode32, zigzag_decode64,
    zigzag_encode32, zigzag_encode64, MAX_VARINT_LEN,
};
pub use wire_type::{key_len, Key, WireType, MAX_TAG, MIN_TAG};
