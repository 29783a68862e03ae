//! The descriptor model: a static description of message and enum shapes.
//!
//! Descriptors are plain data. Something outside this crate produces them
//! (a schema-language parser, hand-written setup code, or a JSON document),
//! and [`SchemaBuilder`](crate::SchemaBuilder) turns them into an
//! immutable [`Schema`](crate::Schema). Nothing here is validated until
//! that build step.
//!
//! The JSON shape follows the serde attributes below, for example:
//!
//! ```json
//! {
//!   "kind": "message",
//!   "name": "Person",
//!   "fields": [
//!     { "name": "name", "tag": 1, "label": "required", "type": { "scalar": "string" } },
//!     { "name": "phone", "tag": 4, "label": "repeated", "type": { "message": "PhoneNumber" } }
//!   ],
//!   "nested": [
//!     { "kind": "enum", "name": "PhoneType", "constants": [ { "name": "HOME", "value": 0 } ] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use tagwire_wire::ScalarType;

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// How many values a field holds, and whether it must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Exactly one value. Decoding fails if it never appears.
    Required,
    /// Zero or one value.
    #[default]
    Optional,
    /// Zero or more values, kept in arrival order.
    Repeated,
}

/// The type of a field: a built-in scalar, or a reference to an enum or
/// message by name.
///
/// Names are resolved relative to the message declaring the field, then
/// each enclosing scope outward. A leading `.` makes a name absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Scalar(ScalarType),
    Enum(String),
    Message(String),
}

impl From<ScalarType> for FieldType {
    fn from(ty: ScalarType) -> Self {
        Self::Scalar(ty)
    }
}

/// One field of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,

    /// The field number written into every key. Unique within the message
    /// and never reused once published.
    pub tag: u32,

    #[serde(default)]
    pub label: Label,

    #[serde(rename = "type")]
    pub ty: FieldType,

    /// The schema's declared default, as text. For enum fields this is the
    /// constant's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, tag: u32, label: Label, ty: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            tag,
            label,
            ty: ty.into(),
            default_value: None,
        }
    }

    pub fn required(name: impl Into<String>, tag: u32, ty: impl Into<FieldType>) -> Self {
        Self::new(name, tag, Label::Required, ty)
    }

    pub fn optional(name: impl Into<String>, tag: u32, ty: impl Into<FieldType>) -> Self {
        Self::new(name, tag, Label::Optional, ty)
    }

    pub fn repeated(name: impl Into<String>, tag: u32, ty: impl Into<FieldType>) -> Self {
        Self::new(name, tag, Label::Repeated, ty)
    }

    /// Sets the declared default.
    pub fn with_default(mut self, text: impl Into<String>) -> Self {
        self.default_value = Some(text.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Messages, enums, enclosing types
// ---------------------------------------------------------------------------

/// A message type: an ordered list of fields plus nested type declarations.
///
/// Field order matters for encoding (fields are written in declaration
/// order) but not for decoding, which accepts tags in any order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<TypeDescriptor>,
}

impl MessageDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares a type nested inside this message.
    pub fn nested(mut self, ty: impl Into<TypeDescriptor>) -> Self {
        self.nested.push(ty.into());
        self
    }
}

/// One named constant of an enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumConstant {
    pub name: String,
    pub value: i32,
}

impl EnumConstant {
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// An enum type. The first constant is the enum's default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    pub constants: Vec<EnumConstant>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constants: Vec::new(),
        }
    }

    pub fn constant(mut self, name: impl Into<String>, value: i32) -> Self {
        self.constants.push(EnumConstant::new(name, value));
        self
    }
}

/// A namespace that only exists to hold nested types. It has no fields and
/// can't be encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnclosingDescriptor {
    pub name: String,
    #[serde(default)]
    pub nested: Vec<TypeDescriptor>,
}

impl EnclosingDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nested: Vec::new(),
        }
    }

    pub fn nested(mut self, ty: impl Into<TypeDescriptor>) -> Self {
        self.nested.push(ty.into());
        self
    }
}

/// Any declarable type.
///
/// `#[serde(tag = "kind")]` gives the internally tagged shape
/// `{ "kind": "message", "name": ..., ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    Message(MessageDescriptor),
    Enum(EnumDescriptor),
    Enclosing(EnclosingDescriptor),
}

impl TypeDescriptor {
    pub fn name(&self) -> &str {
        match self {
            Self::Message(m) => &m.name,
            Self::Enum(e) => &e.name,
            Self::Enclosing(e) => &e.name,
        }
    }

    /// Types declared inside this one. Enums have none.
    pub fn nested(&self) -> &[TypeDescriptor] {
        match self {
            Self::Message(m) => &m.nested,
            Self::Enum(_) => &[],
            Self::Enclosing(e) => &e.nested,
        }
    }
}

impl From<MessageDescriptor> for TypeDescriptor {
    fn from(m: MessageDescriptor) -> Self {
        Self::Message(m)
    }
}

impl From<EnumDescriptor> for TypeDescriptor {
    fn from(e: EnumDescriptor) -> Self {
        Self::Enum(e)
    }
}

impl From<EnclosingDescriptor> for TypeDescriptor {
    fn from(e: EnclosingDescriptor) -> Self {
        Self::Enclosing(e)
    }
}
