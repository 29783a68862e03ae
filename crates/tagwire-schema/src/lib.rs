//! Schema layer for tagwire.
//!
//! This crate turns a static description of message shapes into something
//! a codec can execute:
//!
//! - **Descriptors** ([`MessageDescriptor`], [`FieldDescriptor`],
//!   [`EnumDescriptor`], ...): plain, serde-friendly data handed over by
//!   whatever loads the schema.
//! - **Builder** ([`SchemaBuilder`]): validates tags, resolves type
//!   names, parses defaults.
//! - **Plans** ([`MessagePlan`], [`FieldPlan`], [`Access`],
//!   [`Cardinality`]): per-field behavior decided once, up front.
//! - **Enum codec** ([`EnumType`]): constant ↔ integer.
//!
//! # How it fits in the stack
//!
//! ```text
//! Codec (size / encode / decode)  ← walks the plans
//!     ↕
//! Schema (this crate)             ← descriptors in, plans out
//!     ↕
//! Wire                            ← scalar types and their wire types
//! ```

mod descriptor;
mod enum_type;
mod error;
mod plan;
mod schema;

pub use descriptor::{
    EnclosingDescriptor, EnumConstant, EnumDescriptor, FieldDescriptor, FieldType, Label,
    MessageDescriptor, TypeDescriptor,
};
pub use enum_type::EnumType;
pub use error::SchemaError;
pub use plan::{Access, Cardinality, DefaultValue, EnumId, FieldPlan, MessageId, MessagePlan};
pub use schema::{Schema, SchemaBuilder, TypeRef};
