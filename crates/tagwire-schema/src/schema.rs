//! Building a [`Schema`] from descriptors.
//!
//! The build runs in three passes:
//!
//! 1. **Register** every type under its fully qualified name
//!    (`Outer.Inner`), handing out [`MessageId`]s and [`EnumId`]s.
//! 2. **Enums**: check each has constants with distinct values.
//! 3. **Messages**: check tags and names, resolve type references, parse
//!    defaults, and produce one [`FieldPlan`] per field.
//!
//! Any failure aborts the whole build. After `build()` succeeds the
//! schema is never mutated again; share it by reference or `Arc`.

use std::collections::{HashMap, HashSet};

use tagwire_wire::{MAX_TAG, MIN_TAG};

use crate::plan::{Access, Cardinality, DefaultValue, EnumId, FieldPlan, MessageId, MessagePlan};
use crate::{
    EnumDescriptor, EnumType, FieldDescriptor, FieldType, MessageDescriptor, SchemaError,
    TypeDescriptor,
};

/// What a fully qualified name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    Message(MessageId),
    Enum(EnumId),
    /// A namespace-only type. Can't be used as a field type.
    Enclosing,
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// An immutable, validated set of message and enum types.
///
/// `Schema` is `Send + Sync` and holds no interior mutability, so any
/// number of threads can run codecs against one instance at once.
#[derive(Debug, Clone)]
pub struct Schema {
    messages: Vec<MessagePlan>,
    enums: Vec<EnumType>,
    names: HashMap<String, TypeRef>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Builds a schema from a JSON document of the form
    /// `{ "types": [ <TypeDescriptor>, ... ] }`.
    ///
    /// # Errors
    /// [`SchemaError::Json`] if the document doesn't parse, otherwise any
    /// error [`SchemaBuilder::build`] reports.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        #[derive(serde::Deserialize)]
        struct Document {
            types: Vec<TypeDescriptor>,
        }

        let doc: Document = serde_json::from_str(json)?;
        SchemaBuilder::new().types(doc.types).build()
    }

    /// Looks up a type by fully qualified name. A leading `.` is allowed.
    pub fn lookup(&self, name: &str) -> Option<TypeRef> {
        let name = name.strip_prefix('.').unwrap_or(name);
        self.names.get(name).copied()
    }

    pub fn message_id(&self, name: &str) -> Option<MessageId> {
        match self.lookup(name)? {
            TypeRef::Message(id) => Some(id),
            _ => None,
        }
    }

    pub fn enum_id(&self, name: &str) -> Option<EnumId> {
        match self.lookup(name)? {
            TypeRef::Enum(id) => Some(id),
            _ => None,
        }
    }

    /// The plan for a message. `id` must come from this schema.
    ///
    /// # Panics
    /// If `id` is out of range for this schema.
    pub fn message(&self, id: MessageId) -> &MessagePlan {
        &self.messages[id.0]
    }

    /// The plan for a message, or `None` if `id` doesn't belong to this
    /// schema.
    pub fn get_message(&self, id: MessageId) -> Option<&MessagePlan> {
        self.messages.get(id.0)
    }

    /// The enum codec for an enum. `id` must come from this schema.
    pub fn enum_type(&self, id: EnumId) -> &EnumType {
        &self.enums[id.0]
    }

    pub fn messages(&self) -> impl Iterator<Item = (MessageId, &MessagePlan)> {
        self.messages.iter().enumerate().map(|(i, m)| (MessageId(i), m))
    }

    pub fn enums(&self) -> impl Iterator<Item = (EnumId, &EnumType)> {
        self.enums.iter().enumerate().map(|(i, e)| (EnumId(i), e))
    }
}

// ---------------------------------------------------------------------------
// SchemaBuilder
// ---------------------------------------------------------------------------

/// Collects top-level type descriptors and builds a [`Schema`].
///
/// ```rust
/// use tagwire_schema::{FieldDescriptor, FieldType, MessageDescriptor, Schema};
/// use tagwire_wire::ScalarType;
///
/// let schema = Schema::builder()
///     .add(MessageDescriptor::new("Ping")
///         .field(FieldDescriptor::required("seq", 1, FieldType::Scalar(ScalarType::Uint64))))
///     .build()
///     .unwrap();
/// assert!(schema.message_id("Ping").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    types: Vec<TypeDescriptor>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one top-level type.
    pub fn add(mut self, ty: impl Into<TypeDescriptor>) -> Self {
        self.types.push(ty.into());
        self
    }

    /// Adds several top-level types.
    pub fn types(mut self, types: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        self.types.extend(types);
        self
    }

    /// Validates every descriptor and builds the field plans.
    ///
    /// # Errors
    /// Any [`SchemaError`]. The first problem found aborts the build.
    pub fn build(self) -> Result<Schema, SchemaError> {
        // Pass 1: register names.
        let mut registry = Registry::default();
        for ty in &self.types {
            registry.register(ty, "")?;
        }

        // Pass 2: enums.
        let enums = registry
            .enums
            .iter()
            .map(|(full_name, desc)| build_enum(full_name, desc))
            .collect::<Result<Vec<_>, _>>()?;

        // Pass 3: messages. Needs the finished enums to resolve defaults.
        let messages = registry
            .messages
            .iter()
            .map(|(full_name, desc)| build_message(full_name, desc, &registry.names, &enums))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            messages = messages.len(),
            enums = enums.len(),
            "schema built"
        );

        Ok(Schema {
            messages,
            enums,
            names: registry.names,
        })
    }
}

/// Pass-1 state: every type flattened under its full name.
#[derive(Default)]
struct Registry<'d> {
    names: HashMap<String, TypeRef>,
    messages: Vec<(String, &'d MessageDescriptor)>,
    enums: Vec<(String, &'d EnumDescriptor)>,
}

impl<'d> Registry<'d> {
    fn register(&mut self, ty: &'d TypeDescriptor, scope: &str) -> Result<(), SchemaError> {
        let full_name = qualify(scope, ty.name());
        if self.names.contains_key(&full_name) {
            return Err(SchemaError::DuplicateTypeName(full_name));
        }

        let type_ref = match ty {
            TypeDescriptor::Message(m) => {
                self.messages.push((full_name.clone(), m));
                TypeRef::Message(MessageId(self.messages.len() - 1))
            }
            TypeDescriptor::Enum(e) => {
                self.enums.push((full_name.clone(), e));
                TypeRef::Enum(EnumId(self.enums.len() - 1))
            }
            TypeDescriptor::Enclosing(_) => TypeRef::Enclosing,
        };
        self.names.insert(full_name.clone(), type_ref);

        for nested in ty.nested() {
            self.register(nested, &full_name)?;
        }
        Ok(())
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_owned()
    } else {
        format!("{scope}.{name}")
    }
}

/// Resolves `reference` as seen from inside the type named `scope`:
/// `scope.reference`, then each enclosing scope, then the root.
fn resolve(names: &HashMap<String, TypeRef>, scope: &str, reference: &str) -> Option<TypeRef> {
    if let Some(absolute) = reference.strip_prefix('.') {
        return names.get(absolute).copied();
    }

    let mut scope = scope;
    loop {
        if let Some(found) = names.get(&qualify(scope, reference)) {
            return Some(*found);
        }
        if scope.is_empty() {
            return None;
        }
        scope = match scope.rfind('.') {
            Some(dot) => &scope[..dot],
            None => "",
        };
    }
}

fn build_enum(full_name: &str, desc: &EnumDescriptor) -> Result<EnumType, SchemaError> {
    if desc.constants.is_empty() {
        return Err(SchemaError::EmptyEnum(full_name.to_owned()));
    }

    let mut seen: HashMap<i32, &str> = HashMap::new();
    for constant in &desc.constants {
        if let Some(first) = seen.insert(constant.value, &constant.name) {
            return Err(SchemaError::DuplicateEnumValue {
                enum_name: full_name.to_owned(),
                value: constant.value,
                first: first.to_owned(),
                second: constant.name.clone(),
            });
        }
    }

    Ok(EnumType::new(full_name.to_owned(), desc.constants.clone()))
}

fn build_message(
    full_name: &str,
    desc: &MessageDescriptor,
    names: &HashMap<String, TypeRef>,
    enums: &[EnumType],
) -> Result<MessagePlan, SchemaError> {
    let mut by_tag: HashMap<u32, &str> = HashMap::new();
    let mut names_seen: HashSet<&str> = HashSet::new();
    let mut plans = Vec::with_capacity(desc.fields.len());

    for field in &desc.fields {
        if !(MIN_TAG..=MAX_TAG).contains(&field.tag) {
            return Err(SchemaError::InvalidTag {
                message: full_name.to_owned(),
                field: field.name.clone(),
                tag: field.tag,
            });
        }
        if let Some(first) = by_tag.insert(field.tag, &field.name) {
            return Err(SchemaError::DuplicateTag {
                message: full_name.to_owned(),
                tag: field.tag,
                first: first.to_owned(),
                second: field.name.clone(),
            });
        }
        if !names_seen.insert(&field.name) {
            return Err(SchemaError::DuplicateFieldName {
                message: full_name.to_owned(),
                field: field.name.clone(),
            });
        }

        let access = resolve_access(full_name, field, names)?;
        let cardinality = Cardinality::from(field.label);
        let default = match &field.default_value {
            Some(text) => Some(parse_default(full_name, field, access, cardinality, text, enums)?),
            None => None,
        };

        plans.push(FieldPlan::new(
            field.name.clone(),
            field.tag,
            access,
            cardinality,
            default,
        ));
    }

    tracing::debug!(message_type = %full_name, fields = plans.len(), "message plan built");
    Ok(MessagePlan::new(full_name.to_owned(), plans))
}

fn resolve_access(
    scope: &str,
    field: &FieldDescriptor,
    names: &HashMap<String, TypeRef>,
) -> Result<Access, SchemaError> {
    let (type_name, expected) = match &field.ty {
        FieldType::Scalar(ty) => return Ok(Access::Scalar(*ty)),
        FieldType::Enum(name) => (name, "enum"),
        FieldType::Message(name) => (name, "message"),
    };

    let found = resolve(names, scope, type_name).ok_or_else(|| SchemaError::UnresolvedType {
        message: scope.to_owned(),
        field: field.name.clone(),
        type_name: type_name.clone(),
    })?;

    match (expected, found) {
        ("enum", TypeRef::Enum(id)) => Ok(Access::Enum(id)),
        ("message", TypeRef::Message(id)) => Ok(Access::Message(id)),
        _ => Err(SchemaError::TypeKindMismatch {
            message: scope.to_owned(),
            field: field.name.clone(),
            type_name: type_name.clone(),
            expected,
        }),
    }
}

fn parse_default(
    message: &str,
    field: &FieldDescriptor,
    access: Access,
    cardinality: Cardinality,
    text: &str,
    enums: &[EnumType],
) -> Result<DefaultValue, SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidDefault {
        message: message.to_owned(),
        field: field.name.clone(),
        reason,
    };

    if cardinality == Cardinality::Repeated {
        return Err(invalid("repeated fields cannot declare a default".into()));
    }

    match access {
        Access::Scalar(ty) => ty
            .parse_default(text)
            .map(DefaultValue::Scalar)
            .ok_or_else(|| invalid(format!("`{text}` is not a valid {ty}"))),
        Access::Enum(id) => {
            let enum_type = &enums[id.0];
            enum_type
                .by_name(text.trim())
                .map(|c| DefaultValue::Enum(c.value))
                .ok_or_else(|| {
                    invalid(format!(
                        "`{text}` is not a constant of {}",
                        enum_type.full_name()
                    ))
                })
        }
        Access::Message(_) => Err(invalid("message fields cannot declare a default".into())),
    }
}
