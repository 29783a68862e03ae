//! The message codec: size, encode, and decode driven by message plans.
//!
//! # Encoding
//!
//! Fields are written in declaration order. Each present occurrence is a
//! key followed by its payload; repeated fields write one key per element
//! and absent fields write nothing. The instance's unknown-field bytes come
//! last, verbatim. `size` walks the same path without writing, so
//! `size(m) == encode(m).len()` always holds.
//!
//! # Decoding
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            ▼                              │
//!   ReadingTag ──(no bytes left)──► Finish  │
//!       │                                   │
//!       ├── known tag ──► read payload ─────┤  store: overwrite or append
//!       └── unknown tag ──► skip ───────────┘  keep raw bytes
//! ```
//!
//! `Finish` checks required fields, then fills declared defaults if the
//! codec is configured to. Every error stops decoding and no partial
//! instance escapes.

use bytes::BufMut;
use tagwire_schema::{Access, DefaultValue, EnumType, FieldPlan, MessageId, MessagePlan, Schema};
use tagwire_wire::{
    encode_varint, encoded_len_varint, length_delimited_len, WireReader, WireType,
};
use tracing::{debug, trace};

use crate::value::FieldSlot;
use crate::{
    CodecConfig, CodecError, DynamicMessage, UnknownFieldsBuilder, UnrecognizedEnumPolicy, Value,
};

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Entry point: a schema plus the settings every decode runs with.
///
/// A `Codec` only borrows its schema and never mutates anything, so one
/// schema can back any number of codecs on any number of threads.
///
/// ```
/// use tagwire_codec::Codec;
/// use tagwire_schema::{FieldDescriptor, MessageDescriptor, Schema};
/// use tagwire_wire::ScalarType;
///
/// let schema = Schema::builder()
///     .add(MessageDescriptor::new("Ping").field(FieldDescriptor::required("seq", 1, ScalarType::Uint32)))
///     .build()
///     .unwrap();
/// let codec = Codec::new(&schema);
/// let ping = codec.message("Ping").unwrap();
///
/// let mut msg = ping.new_message();
/// ping.set(&mut msg, "seq", tagwire_wire::ScalarValue::Uint32(150)).unwrap();
/// assert_eq!(ping.encode(&msg).unwrap(), vec![0x08, 0x96, 0x01]);
/// ```
#[derive(Debug, Clone)]
pub struct Codec<'s> {
    schema: &'s Schema,
    config: CodecConfig,
}

impl<'s> Codec<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            config: CodecConfig::default(),
        }
    }

    /// Creates a codec with custom settings. Out-of-range values are
    /// clamped (see [`CodecConfig::validated`]).
    pub fn with_config(schema: &'s Schema, config: CodecConfig) -> Self {
        Self {
            schema,
            config: config.validated(),
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// The codec for the message type named `name` (fully qualified).
    ///
    /// # Errors
    /// [`CodecError::UnknownMessage`] if the schema has no such message.
    pub fn message(&self, name: &str) -> Result<MessageCodec<'_>, CodecError> {
        let id = self
            .schema
            .message_id(name)
            .ok_or_else(|| CodecError::UnknownMessage(name.to_owned()))?;
        Ok(self.message_by_id(id))
    }

    /// The codec for a message type by handle. `id` must come from this
    /// codec's schema.
    ///
    /// # Panics
    /// If `id` is out of range for the schema.
    pub fn message_by_id(&self, id: MessageId) -> MessageCodec<'_> {
        MessageCodec {
            schema: self.schema,
            config: &self.config,
            id,
            plan: self.schema.message(id),
        }
    }

    /// The codec for the type `msg` is an instance of. Handy for nested
    /// messages pulled out of a parent.
    ///
    /// # Panics
    /// If `msg` was created against a different schema with fewer
    /// message types.
    pub fn codec_for(&self, msg: &DynamicMessage) -> MessageCodec<'_> {
        self.message_by_id(msg.message_id())
    }

    /// The enum codec for the enum type named `name`.
    ///
    /// # Errors
    /// [`CodecError::UnknownEnum`] if the schema has no such enum.
    pub fn enum_type(&self, name: &str) -> Result<&'s EnumType, CodecError> {
        let id = self
            .schema
            .enum_id(name)
            .ok_or_else(|| CodecError::UnknownEnum(name.to_owned()))?;
        Ok(self.schema.enum_type(id))
    }
}

// ---------------------------------------------------------------------------
// MessageCodec
// ---------------------------------------------------------------------------

/// Size, encode, decode, and field access for one message type.
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec<'c> {
    schema: &'c Schema,
    config: &'c CodecConfig,
    id: MessageId,
    plan: &'c MessagePlan,
}

impl<'c> MessageCodec<'c> {
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn name(&self) -> &'c str {
        self.plan.full_name()
    }

    pub fn plan(&self) -> &'c MessagePlan {
        self.plan
    }

    /// A new instance with every field unset.
    pub fn new_message(&self) -> DynamicMessage {
        DynamicMessage::empty(self.id, self.plan)
    }

    // -- size / encode / decode ---------------------------------------------

    /// Exact number of bytes [`encode`](Self::encode) produces for `msg`.
    ///
    /// Sizes the instance against its own type, so it never fails. An
    /// instance from another schema gets a size that means nothing, but
    /// no panic.
    pub fn size(&self, msg: &DynamicMessage) -> usize {
        message_len(self.schema, msg)
    }

    /// Encodes `msg` into a new buffer of exactly [`size`](Self::size) bytes.
    ///
    /// # Errors
    /// - [`CodecError::WrongMessageType`] if `msg` isn't an instance of this
    ///   codec's type.
    /// - [`CodecError::MissingRequiredField`] if a required field is unset
    ///   anywhere in the tree.
    pub fn encode(&self, msg: &DynamicMessage) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::with_capacity(self.size(msg));
        self.encode_to(msg, &mut buf)?;
        Ok(buf)
    }

    /// Encodes `msg` onto the end of `buf`.
    ///
    /// The whole tree is checked before the first byte is written, so on
    /// error `buf` is untouched.
    pub fn encode_to<B: BufMut + ?Sized>(
        &self,
        msg: &DynamicMessage,
        buf: &mut B,
    ) -> Result<(), CodecError> {
        self.check_type(msg)?;
        check_initialized(self.schema, msg)?;
        write_message(self.schema, msg, buf);
        Ok(())
    }

    /// Decodes one instance from `data`, which must hold exactly one
    /// encoded message (no outer length prefix).
    ///
    /// # Errors
    /// Any malformed-wire error, or [`CodecError::MissingRequiredField`].
    pub fn decode(&self, data: &[u8]) -> Result<DynamicMessage, CodecError> {
        let decoder = Decoder {
            schema: self.schema,
            config: self.config,
        };
        decoder.decode_message(self.id, data, 0)
    }

    // -- field access ---------------------------------------------------------

    /// Sets a singular field, replacing any previous value.
    pub fn set(
        &self,
        msg: &mut DynamicMessage,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), CodecError> {
        self.check_type(msg)?;
        let (index, plan) = self.field(field)?;
        if plan.is_repeated() {
            return Err(self.is_repeated(plan));
        }
        let value = value.into();
        self.check_value(plan, &value)?;
        msg.slot_mut(index).store(value);
        Ok(())
    }

    /// Appends one element to a repeated field.
    pub fn push(
        &self,
        msg: &mut DynamicMessage,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), CodecError> {
        self.check_type(msg)?;
        let (index, plan) = self.field(field)?;
        if !plan.is_repeated() {
            return Err(self.not_repeated(plan));
        }
        let value = value.into();
        self.check_value(plan, &value)?;
        msg.slot_mut(index).store(value);
        Ok(())
    }

    /// The value of a singular field, or `None` if it is unset.
    pub fn get<'m>(
        &self,
        msg: &'m DynamicMessage,
        field: &str,
    ) -> Result<Option<&'m Value>, CodecError> {
        self.check_type(msg)?;
        let (index, plan) = self.field(field)?;
        if plan.is_repeated() {
            return Err(self.is_repeated(plan));
        }
        Ok(msg.slot(index).values().first())
    }

    /// The value of a singular field, falling back to its effective default
    /// when unset.
    ///
    /// The effective default is the declared default if there is one,
    /// otherwise the type's zero value: `0`, `false`, `""`, empty bytes,
    /// the first enum constant, or an empty message.
    pub fn get_or_default(&self, msg: &DynamicMessage, field: &str) -> Result<Value, CodecError> {
        match self.get(msg, field)? {
            Some(value) => Ok(value.clone()),
            None => {
                let (_, plan) = self.field(field)?;
                Ok(self.effective_default(plan))
            }
        }
    }

    /// The elements of a repeated field, in order.
    pub fn repeated<'m>(
        &self,
        msg: &'m DynamicMessage,
        field: &str,
    ) -> Result<&'m [Value], CodecError> {
        self.check_type(msg)?;
        let (index, plan) = self.field(field)?;
        if !plan.is_repeated() {
            return Err(self.not_repeated(plan));
        }
        Ok(msg.slot(index).values())
    }

    /// Returns `true` if a singular field is set or a repeated field has
    /// at least one element.
    pub fn has(&self, msg: &DynamicMessage, field: &str) -> Result<bool, CodecError> {
        self.check_type(msg)?;
        let (index, _) = self.field(field)?;
        Ok(!msg.slot(index).values().is_empty())
    }

    /// Unsets a singular field or empties a repeated one.
    pub fn clear(&self, msg: &mut DynamicMessage, field: &str) -> Result<(), CodecError> {
        self.check_type(msg)?;
        let (index, _) = self.field(field)?;
        msg.slot_mut(index).clear();
        Ok(())
    }

    // -- helpers --------------------------------------------------------------

    fn field(&self, name: &str) -> Result<(usize, &'c FieldPlan), CodecError> {
        let index = self
            .plan
            .index_of_name(name)
            .ok_or_else(|| CodecError::NoSuchField {
                message: self.name().to_owned(),
                field: name.to_owned(),
            })?;
        Ok((index, self.plan.field(index)))
    }

    /// Instances only carry a handle, so one built against another schema
    /// is caught by its slot count when the handles happen to agree.
    fn check_type(&self, msg: &DynamicMessage) -> Result<(), CodecError> {
        if msg.message_id() == self.id && msg.slots().len() == self.plan.fields().len() {
            Ok(())
        } else {
            Err(CodecError::WrongMessageType {
                expected: self.name().to_owned(),
                found: type_name(self.schema, msg.message_id()),
            })
        }
    }

    fn check_value(&self, field: &FieldPlan, value: &Value) -> Result<(), CodecError> {
        match (field.access, value) {
            (Access::Scalar(ty), Value::Scalar(v)) if v.scalar_type() == ty => Ok(()),
            (Access::Enum(id), Value::Enum(n)) => {
                let enum_type = self.schema.enum_type(id);
                if enum_type.is_known(*n)
                    || self.config.unrecognized_enum == UnrecognizedEnumPolicy::Retain
                {
                    Ok(())
                } else {
                    Err(CodecError::InvalidEnumValue {
                        enum_name: enum_type.full_name().to_owned(),
                        value: *n,
                    })
                }
            }
            (Access::Message(id), Value::Message(m)) if m.message_id() == id => Ok(()),
            (Access::Message(id), Value::Message(m)) => Err(CodecError::WrongMessageType {
                expected: self.schema.message(id).full_name().to_owned(),
                found: type_name(self.schema, m.message_id()),
            }),
            (access, value) => Err(CodecError::TypeMismatch {
                message: self.name().to_owned(),
                field: field.name.clone(),
                expected: self.describe_access(access),
                found: value.describe(),
            }),
        }
    }

    fn describe_access(&self, access: Access) -> String {
        match access {
            Access::Scalar(ty) => ty.to_string(),
            Access::Enum(id) => format!("enum {}", self.schema.enum_type(id).full_name()),
            Access::Message(id) => format!("message {}", self.schema.message(id).full_name()),
        }
    }

    fn effective_default(&self, field: &FieldPlan) -> Value {
        if let Some(default) = &field.default {
            return default_value(default);
        }
        match field.access {
            Access::Scalar(ty) => Value::Scalar(ty.zero_value()),
            Access::Enum(id) => Value::Enum(self.schema.enum_type(id).default_constant().value),
            Access::Message(id) => {
                Value::Message(DynamicMessage::empty(id, self.schema.message(id)))
            }
        }
    }

    fn is_repeated(&self, field: &FieldPlan) -> CodecError {
        CodecError::IsRepeated {
            message: self.name().to_owned(),
            field: field.name.clone(),
        }
    }

    fn not_repeated(&self, field: &FieldPlan) -> CodecError {
        CodecError::NotRepeated {
            message: self.name().to_owned(),
            field: field.name.clone(),
        }
    }
}

fn default_value(default: &DefaultValue) -> Value {
    match default {
        DefaultValue::Scalar(v) => Value::Scalar(v.clone()),
        DefaultValue::Enum(n) => Value::Enum(*n),
    }
}

// ---------------------------------------------------------------------------
// Size and encode
// ---------------------------------------------------------------------------

/// The full name of `id`, or its handle if it isn't from `schema`.
fn type_name(schema: &Schema, id: MessageId) -> String {
    schema
        .get_message(id)
        .map_or_else(|| id.to_string(), |plan| plan.full_name().to_owned())
}

/// The field plans `msg` is laid out by. Empty for a foreign instance.
fn fields_of<'s>(schema: &'s Schema, msg: &DynamicMessage) -> &'s [FieldPlan] {
    schema
        .get_message(msg.message_id())
        .map_or(&[][..], MessagePlan::fields)
}

fn message_len(schema: &Schema, msg: &DynamicMessage) -> usize {
    let known: usize = fields_of(schema, msg)
        .iter()
        .zip(msg.slots())
        .map(|(field, slot)| {
            slot.values()
                .iter()
                .map(|v| field.key_len() + value_len(schema, v))
                .sum::<usize>()
        })
        .sum();
    known + msg.unknown_fields().len()
}

fn value_len(schema: &Schema, value: &Value) -> usize {
    match value {
        Value::Scalar(v) => v.encoded_len(),
        Value::Enum(n) => encoded_len_varint(i64::from(*n) as u64),
        Value::Message(m) => length_delimited_len(message_len(schema, m)),
    }
}

/// Fails on the first unset required field, searching depth-first.
fn check_initialized(schema: &Schema, msg: &DynamicMessage) -> Result<(), CodecError> {
    let Some(plan) = schema.get_message(msg.message_id()) else {
        return Err(CodecError::WrongMessageType {
            expected: "a message of this schema".to_owned(),
            found: msg.message_id().to_string(),
        });
    };
    for (index, field) in plan.required_fields() {
        if msg.slots().get(index).is_none_or(|slot| slot.values().is_empty()) {
            return Err(CodecError::MissingRequiredField {
                message: plan.full_name().to_owned(),
                field: field.name.clone(),
            });
        }
    }
    for slot in msg.slots() {
        for value in slot.values() {
            if let Value::Message(nested) = value {
                check_initialized(schema, nested)?;
            }
        }
    }
    Ok(())
}

fn write_message<B: BufMut + ?Sized>(schema: &Schema, msg: &DynamicMessage, buf: &mut B) {
    for (field, slot) in fields_of(schema, msg).iter().zip(msg.slots()) {
        for value in slot.values() {
            field.key().encode(buf);
            write_value(schema, value, buf);
        }
    }
    buf.put_slice(msg.unknown_fields());
}

fn write_value<B: BufMut + ?Sized>(schema: &Schema, value: &Value, buf: &mut B) {
    match value {
        Value::Scalar(v) => v.encode(buf),
        Value::Enum(n) => encode_varint(i64::from(*n) as u64, buf),
        Value::Message(m) => {
            encode_varint(message_len(schema, m) as u64, buf);
            write_message(schema, m, buf);
        }
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Result of reading one field payload.
enum Decoded {
    Value(Value),
    /// An enum number the enum doesn't declare, under
    /// [`UnrecognizedEnumPolicy::PreserveAsUnknown`].
    UnrecognizedEnum(i32),
}

struct Decoder<'a> {
    schema: &'a Schema,
    config: &'a CodecConfig,
}

impl Decoder<'_> {
    fn decode_message(
        &self,
        id: MessageId,
        data: &[u8],
        depth: u32,
    ) -> Result<DynamicMessage, CodecError> {
        let plan = self.schema.message(id);
        if depth > self.config.recursion_limit {
            return Err(CodecError::RecursionLimitExceeded {
                message: plan.full_name().to_owned(),
                limit: self.config.recursion_limit,
            });
        }

        let mut msg = DynamicMessage::empty(id, plan);
        let mut unknown = UnknownFieldsBuilder::new();
        let mut reader = WireReader::new(data);

        while !reader.is_empty() {
            let start = reader.position();
            let key = reader.read_key()?;

            let Some(index) = plan.index_of_tag(key.tag) else {
                reader.skip_field(key)?;
                let raw = reader.consumed_since(start);
                trace!(
                    message_type = plan.full_name(),
                    tag = key.tag,
                    wire_type = %key.wire_type,
                    len = raw.len(),
                    "kept unknown field"
                );
                unknown.push(raw);
                continue;
            };
            let field = plan.field(index);

            if key.wire_type == field.wire_type {
                match self.read_value(field, &mut reader, depth)? {
                    Decoded::Value(value) => msg.slot_mut(index).store(value),
                    Decoded::UnrecognizedEnum(_) => unknown.push(reader.consumed_since(start)),
                }
            } else if key.wire_type == WireType::LengthDelimited && field.accepts_packed() {
                let mut packed = WireReader::new(reader.read_length_delimited()?);
                while !packed.is_empty() {
                    match self.read_value(field, &mut packed, depth)? {
                        Decoded::Value(value) => msg.slot_mut(index).store(value),
                        Decoded::UnrecognizedEnum(n) => {
                            unknown.push_varint(field.tag, i64::from(n) as u64)
                        }
                    }
                }
            } else {
                return Err(CodecError::WireTypeMismatch {
                    message: plan.full_name().to_owned(),
                    field: field.name.clone(),
                    expected: field.wire_type,
                    actual: key.wire_type,
                });
            }
        }

        for (index, field) in plan.required_fields() {
            if msg.slot(index).values().is_empty() {
                return Err(CodecError::MissingRequiredField {
                    message: plan.full_name().to_owned(),
                    field: field.name.clone(),
                });
            }
        }

        if self.config.populate_defaults {
            for (index, field) in plan.fields().iter().enumerate() {
                let Some(default) = &field.default else {
                    continue;
                };
                if let FieldSlot::Single(slot @ None) = msg.slot_mut(index) {
                    *slot = Some(default_value(default));
                }
            }
        }

        msg.set_unknown_fields(unknown.finish());
        Ok(msg)
    }

    fn read_value(
        &self,
        field: &FieldPlan,
        reader: &mut WireReader<'_>,
        depth: u32,
    ) -> Result<Decoded, CodecError> {
        match field.access {
            Access::Scalar(ty) => Ok(Decoded::Value(Value::Scalar(ty.read(reader)?))),
            Access::Enum(id) => {
                // int32 on the wire: keep the low 32 bits.
                let n = reader.read_varint()? as i32;
                let enum_type = self.schema.enum_type(id);
                if enum_type.is_known(n) {
                    return Ok(Decoded::Value(Value::Enum(n)));
                }
                debug!(
                    enum_name = enum_type.full_name(),
                    field = %field.name,
                    value = n,
                    policy = ?self.config.unrecognized_enum,
                    "unrecognized enum value"
                );
                match self.config.unrecognized_enum {
                    UnrecognizedEnumPolicy::PreserveAsUnknown => Ok(Decoded::UnrecognizedEnum(n)),
                    UnrecognizedEnumPolicy::Retain => Ok(Decoded::Value(Value::Enum(n))),
                }
            }
            Access::Message(id) => {
                let payload = reader.read_length_delimited()?;
                let nested = self.decode_message(id, payload, depth + 1)?;
                Ok(Decoded::Value(Value::Message(nested)))
            }
        }
    }
}
