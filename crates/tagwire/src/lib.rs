//! # Tagwire
//!
//! Schema-driven binary message codec, wire-compatible with protocol
//! buffers.
//!
//! Describe message shapes once, as descriptors or JSON, build a
//! [`Schema`], and get three operations per message type: compute the
//! encoded size, encode, and decode. Fields the schema doesn't know are
//! carried through untouched, so older readers don't drop newer data.
//!
//! ## Quick Start
//!
//! ```rust
//! use tagwire::prelude::*;
//!
//! # fn main() -> tagwire::Result<()> {
//! let schema = Schema::builder()
//!     .add(
//!         MessageDescriptor::new("Person")
//!             .field(FieldDescriptor::required("name", 1, ScalarType::String))
//!             .field(FieldDescriptor::required("id", 2, ScalarType::Int32))
//!             .field(FieldDescriptor::optional("email", 3, ScalarType::String)),
//!     )
//!     .build()?;
//!
//! let codec = Codec::new(&schema);
//! let person = codec.message("Person")?;
//!
//! let mut msg = person.new_message();
//! person.set(&mut msg, "name", "X")?;
//! person.set(&mut msg, "id", ScalarValue::Int32(1))?;
//!
//! let bytes = person.encode(&msg)?;
//! assert_eq!(bytes, [0x0a, 0x01, b'X', 0x10, 0x01]);
//! assert_eq!(person.size(&msg), bytes.len());
//! assert_eq!(person.decode(&bytes)?, msg);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate layout
//!
//! - [`wire`]: varints, keys, scalar encodings, the byte reader.
//! - [`schema`]: descriptors, the schema builder, field plans, enums.
//! - [`codec`]: size/encode/decode, dynamic messages, unknown fields,
//!   and helpers for statically typed messages.

mod error;

pub use error::{Result, TagwireError};

pub use bytes;
pub use tagwire_codec as codec;
pub use tagwire_schema as schema;
pub use tagwire_wire as wire;

pub use tagwire_codec::{
    Codec, CodecConfig, CodecError, DynamicMessage, Message, MessageCodec, UnknownFields,
    UnrecognizedEnumPolicy, Value,
};
pub use tagwire_schema::{Schema, SchemaBuilder, SchemaError};
pub use tagwire_wire::{ScalarType, ScalarValue, WireError, WireType};

/// Everything needed to build a schema and run codecs against it.
pub mod prelude {
    pub use crate::{Result, TagwireError};
    pub use tagwire_codec::{
        Codec, CodecConfig, DynamicMessage, Message, MessageCodec, UnknownFields,
        UnrecognizedEnumPolicy, Value,
    };
    pub use tagwire_schema::{
        EnclosingDescriptor, EnumDescriptor, FieldDescriptor, FieldType, Label,
        MessageDescriptor, Schema,
    };
    pub use tagwire_wire::{ScalarType, ScalarValue};
}
