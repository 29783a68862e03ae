//! Field plans: everything the codec needs to know about a field, worked
//! out once at build time.
//!
//! A descriptor says *what* a field is ("`phone`, tag 4, repeated
//! `PhoneNumber`"). A plan says *how* to handle it: which wire type to
//! expect, whether to delegate to a scalar codec, an enum, or another
//! message, and whether to overwrite, append, or insist on presence. The
//! codec reads plans; it never looks at descriptors or type names.

use std::collections::HashMap;
use std::fmt;

use tagwire_wire::{key_len, Key, ScalarType, ScalarValue, WireType};

use crate::Label;

// ---------------------------------------------------------------------------
// Type handles
// ---------------------------------------------------------------------------

/// Identifies a message type within one [`Schema`](crate::Schema).
///
/// Handles from one schema mean nothing to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub(crate) usize);

impl MessageId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// Identifies an enum type within one [`Schema`](crate::Schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(pub(crate) usize);

impl EnumId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EnumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Access and cardinality
// ---------------------------------------------------------------------------

/// Where a field's payload goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read and written directly by the scalar codec.
    Scalar(ScalarType),
    /// A varint mapped through the enum codec.
    Enum(EnumId),
    /// A length-delimited payload handed to the nested type's own codec.
    Message(MessageId),
}

impl Access {
    pub fn wire_type(self) -> WireType {
        match self {
            Self::Scalar(ty) => ty.wire_type(),
            Self::Enum(_) => WireType::Varint,
            Self::Message(_) => WireType::LengthDelimited,
        }
    }
}

/// How many occurrences a field takes and what happens on each one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Last occurrence wins; decoding fails if there is none.
    Required,
    /// Last occurrence wins; absence leaves the field unset.
    Optional,
    /// Each occurrence is appended.
    Repeated,
}

impl From<Label> for Cardinality {
    fn from(label: Label) -> Self {
        match label {
            Label::Required => Self::Required,
            Label::Optional => Self::Optional,
            Label::Repeated => Self::Repeated,
        }
    }
}

/// A parsed default value.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Scalar(ScalarValue),
    /// The constant's wire value.
    Enum(i32),
}

// ---------------------------------------------------------------------------
// FieldPlan
// ---------------------------------------------------------------------------

/// The plan for one field.
#[derive(Debug, Clone)]
pub struct FieldPlan {
    pub name: String,
    pub tag: u32,
    /// The wire type this field is written with, and expected with on
    /// decode (packed repeated fields aside).
    pub wire_type: WireType,
    pub access: Access,
    pub cardinality: Cardinality,
    pub default: Option<DefaultValue>,
}

impl FieldPlan {
    pub(crate) fn new(
        name: String,
        tag: u32,
        access: Access,
        cardinality: Cardinality,
        default: Option<DefaultValue>,
    ) -> Self {
        Self {
            name,
            tag,
            wire_type: access.wire_type(),
            access,
            cardinality,
            default,
        }
    }

    /// The key written before every occurrence of this field.
    pub fn key(&self) -> Key {
        Key::new(self.tag, self.wire_type)
    }

    /// Bytes taken by the key.
    pub fn key_len(&self) -> usize {
        key_len(self.tag)
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    pub fn is_required(&self) -> bool {
        self.cardinality == Cardinality::Required
    }

    /// Returns `true` if a decoder should also accept this field in packed
    /// form (several values in one length-delimited payload).
    pub fn accepts_packed(&self) -> bool {
        self.is_repeated() && self.wire_type.is_packable()
    }
}

// ---------------------------------------------------------------------------
// MessagePlan
// ---------------------------------------------------------------------------

/// The plans for every field of one message, in declaration order, plus
/// a tag index for decode dispatch.
#[derive(Debug, Clone)]
pub struct MessagePlan {
    full_name: String,
    fields: Vec<FieldPlan>,
    by_tag: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
}

impl MessagePlan {
    /// Callers guarantee tags and names are unique.
    pub(crate) fn new(full_name: String, fields: Vec<FieldPlan>) -> Self {
        let by_tag = fields.iter().enumerate().map(|(i, f)| (f.tag, i)).collect();
        let by_name = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self {
            full_name,
            fields,
            by_tag,
            by_name,
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Field plans in declaration order. A field's position here is its
    /// index everywhere else (e.g. in a decoded instance).
    pub fn fields(&self) -> &[FieldPlan] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> &FieldPlan {
        &self.fields[index]
    }

    /// Index of the field with `tag`, or `None` for a tag this message
    /// doesn't declare.
    pub fn index_of_tag(&self, tag: u32) -> Option<usize> {
        self.by_tag.get(&tag).copied()
    }

    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Iterates the required fields with their indices.
    pub fn required_fields(&self) -> impl Iterator<Item = (usize, &FieldPlan)> {
        self.fields.iter().enumerate().filter(|(_, f)| f.is_required())
    }
}
