//! Dynamic message instances.

use bytes::Bytes;
use tagwire_schema::{MessageId, MessagePlan};
use tagwire_wire::ScalarValue;

use crate::UnknownFields;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// The value of one field occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(ScalarValue),
    /// An enum field's wire value. Usually a declared constant; an
    /// undeclared number only appears under
    /// [`UnrecognizedEnumPolicy::Retain`](crate::UnrecognizedEnumPolicy::Retain).
    Enum(i32),
    Message(DynamicMessage),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(ScalarValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<i32> {
        match self {
            Self::Enum(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Short description for type-mismatch errors.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Scalar(v) => v.scalar_type().to_string(),
            Self::Enum(_) => "enum value".to_owned(),
            Self::Message(_) => "message".to_owned(),
        }
    }
}

impl From<ScalarValue> for Value {
    fn from(v: ScalarValue) -> Self {
        Self::Scalar(v)
    }
}

impl From<DynamicMessage> for Value {
    fn from(m: DynamicMessage) -> Self {
        Self::Message(m)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Scalar(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Scalar(s.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Scalar(b.into())
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Self::Scalar(ScalarValue::Bytes(b))
    }
}

// ---------------------------------------------------------------------------
// DynamicMessage
// ---------------------------------------------------------------------------

/// Storage for one field of an instance.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldSlot {
    Single(Option<Value>),
    Repeated(Vec<Value>),
}

impl FieldSlot {
    /// Overwrites a singular field, appends to a repeated one.
    pub(crate) fn store(&mut self, value: Value) {
        match self {
            Self::Single(slot) => *slot = Some(value),
            Self::Repeated(values) => values.push(value),
        }
    }

    pub(crate) fn values(&self) -> &[Value] {
        match self {
            Self::Single(slot) => slot.as_slice(),
            Self::Repeated(values) => values,
        }
    }

    pub(crate) fn clear(&mut self) {
        match self {
            Self::Single(slot) => *slot = None,
            Self::Repeated(values) => values.clear(),
        }
    }
}

/// An instance of a schema-defined message type.
///
/// Holds one slot per declared field, in declaration order, plus the
/// unknown fields seen while decoding. Two instances are equal when they
/// have the same type, the same field values, and the same unknown bytes.
///
/// Fields are read and written by name through a
/// [`MessageCodec`](crate::MessageCodec), which checks values against the
/// field's type.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    message: MessageId,
    slots: Vec<FieldSlot>,
    unknown_fields: UnknownFields,
}

impl DynamicMessage {
    /// An instance of `plan` with every field unset.
    pub(crate) fn empty(message: MessageId, plan: &MessagePlan) -> Self {
        let slots = plan
            .fields()
            .iter()
            .map(|f| {
                if f.is_repeated() {
                    FieldSlot::Repeated(Vec::new())
                } else {
                    FieldSlot::Single(None)
                }
            })
            .collect();
        Self {
            message,
            slots,
            unknown_fields: UnknownFields::new(),
        }
    }

    /// The message type this is an instance of.
    pub fn message_id(&self) -> MessageId {
        self.message
    }

    pub fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown_fields
    }

    /// Replaces the unknown-field bytes.
    ///
    /// The bytes must be a sequence of complete fields; they are written
    /// out unchecked by encode.
    pub fn set_unknown_fields(&mut self, fields: UnknownFields) {
        self.unknown_fields = fields;
    }

    pub fn clear_unknown_fields(&mut self) {
        self.unknown_fields = UnknownFields::new();
    }

    pub(crate) fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    pub(crate) fn slot(&self, index: usize) -> &FieldSlot {
        &self.slots[index]
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut FieldSlot {
        &mut self.slots[index]
    }
}
