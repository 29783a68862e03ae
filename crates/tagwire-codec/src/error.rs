//! Error types for the codec layer.

use tagwire_wire::{WireError, WireType};

/// Errors that can occur while encoding, decoding, or editing a message.
///
/// Decode errors fall into two kinds:
///
/// - **Malformed wire** ([`Malformed`](Self::Malformed),
///   [`WireTypeMismatch`](Self::WireTypeMismatch),
///   [`RecursionLimitExceeded`](Self::RecursionLimitExceeded)): the bytes
///   can't be a valid encoding. Decoding stops at the first one.
/// - **Missing required field**: the bytes parsed fine but a required
///   field never appeared.
///
/// Either way no partial message is returned, and an error inside a nested
/// message reaches the caller unchanged. Unknown tags and unrecognized
/// enum values are not errors at all.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A required field was never set (decode) or is unset (encode).
    #[error("message {message}: required field `{field}` is missing")]
    MissingRequiredField { message: String, field: String },

    /// Truncated input, an overlong varint, a bad key, invalid UTF-8, ...
    #[error("malformed input: {0}")]
    Malformed(#[from] WireError),

    /// A known field arrived with a wire type its declared type can't have,
    /// e.g. a length-delimited payload for a `fixed32` field.
    #[error("message {message}: field `{field}` expects wire type {expected}, got {actual}")]
    WireTypeMismatch {
        message: String,
        field: String,
        expected: WireType,
        actual: WireType,
    },

    /// Nested messages go deeper than the configured limit.
    #[error("message {message}: nesting exceeds {limit} levels")]
    RecursionLimitExceeded { message: String, limit: u32 },

    /// No message type with this name in the schema.
    #[error("unknown message type `{0}`")]
    UnknownMessage(String),

    /// No enum type with this name in the schema.
    #[error("unknown enum type `{0}`")]
    UnknownEnum(String),

    /// The message declares no field with this name.
    #[error("message {message} has no field `{field}`")]
    NoSuchField { message: String, field: String },

    /// A value doesn't match the field's declared type.
    #[error("message {message}: field `{field}` expects {expected}, got {found}")]
    TypeMismatch {
        message: String,
        field: String,
        expected: String,
        found: String,
    },

    /// `push`/`repeated` used on a singular field.
    #[error("message {message}: field `{field}` is not repeated")]
    NotRepeated { message: String, field: String },

    /// `set`/`get` used on a repeated field.
    #[error("message {message}: field `{field}` is repeated")]
    IsRepeated { message: String, field: String },

    /// An instance of one message type was handed to another type's codec.
    #[error("expected a {expected} instance, got {found}")]
    WrongMessageType { expected: String, found: String },

    /// An enum field was set to a number the enum doesn't declare, while
    /// the codec is configured to keep such numbers out of fields.
    #[error("enum {enum_name} has no constant with value {value}")]
    InvalidEnumValue { enum_name: String, value: i32 },
}

impl CodecError {
    /// Returns `true` for the "malformed wire" kind of error.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Malformed(_) | Self::WireTypeMismatch { .. } | Self::RecursionLimitExceeded { .. }
        )
    }
}
