//! Error types for the schema layer.
//!
//! All of these are build-time errors. A schema that fails to build never
//! reaches the codec, so a bad descriptor is caught once at startup rather
//! than on some later decode.

/// Errors that can occur while building a [`Schema`](crate::Schema).
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Two fields in one message share a tag.
    #[error("message {message}: tag {tag} is used by both `{first}` and `{second}`")]
    DuplicateTag {
        message: String,
        tag: u32,
        first: String,
        second: String,
    },

    /// A field's tag is 0 or beyond the 29-bit maximum.
    #[error("message {message}: field `{field}` has invalid tag {tag}")]
    InvalidTag {
        message: String,
        field: String,
        tag: u32,
    },

    /// Two fields in one message share a name.
    #[error("message {message}: field name `{field}` is declared twice")]
    DuplicateFieldName { message: String, field: String },

    /// Two types resolve to the same fully qualified name.
    #[error("type {0} is declared twice")]
    DuplicateTypeName(String),

    /// A field refers to a type name that doesn't exist in any enclosing
    /// scope.
    #[error("message {message}: field `{field}` refers to unknown type `{type_name}`")]
    UnresolvedType {
        message: String,
        field: String,
        type_name: String,
    },

    /// A field declared as an enum names a message, or the other way round.
    #[error("message {message}: field `{field}` expects {expected} `{type_name}`, which is not one")]
    TypeKindMismatch {
        message: String,
        field: String,
        type_name: String,
        expected: &'static str,
    },

    /// Two constants of one enum share a value.
    #[error("enum {enum_name}: value {value} is used by both `{first}` and `{second}`")]
    DuplicateEnumValue {
        enum_name: String,
        value: i32,
        first: String,
        second: String,
    },

    /// An enum has no constants, so it has no default.
    #[error("enum {0} declares no constants")]
    EmptyEnum(String),

    /// A declared default doesn't parse as the field's type, or is placed
    /// on a field that can't carry one.
    #[error("message {message}: field `{field}` has invalid default: {reason}")]
    InvalidDefault {
        message: String,
        field: String,
        reason: String,
    },

    /// The JSON schema document could not be parsed.
    #[cfg(feature = "json")]
    #[error("schema document is not valid: {0}")]
    Json(#[from] serde_json::Error),
}
