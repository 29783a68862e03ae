//! Codec layer for tagwire.
//!
//! Given a built [`Schema`](tagwire_schema::Schema), this crate converts
//! between message instances and wire bytes:
//!
//! - **[`Codec`] / [`MessageCodec`]**: `size`, `encode`, `decode` and
//!   by-name field access for [`DynamicMessage`] instances.
//! - **[`UnknownFields`]**: raw bytes of fields the schema doesn't know,
//!   carried through a decode/encode round trip untouched.
//! - **[`Message`]** and helpers: the same wire behavior for plain Rust
//!   structs.
//! - **[`CodecConfig`]**: unrecognized-enum policy, default population,
//!   recursion limit.

mod codec;
mod config;
mod error;
mod typed;
mod unknown;
mod value;

pub use codec::{Codec, MessageCodec};
pub use config::{CodecConfig, UnrecognizedEnumPolicy};
pub use error::CodecError;
pub use typed::{
    decode_fields, decode_nested, encode_message_with_tag, message_len_with_tag, required,
    FieldOutcome, Message,
};
pub use unknown::{UnknownFields, UnknownFieldsBuilder};
pub use value::{DynamicMessage, Value};
