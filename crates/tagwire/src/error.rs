//! Unified error type for tagwire.

use tagwire_codec::CodecError;
use tagwire_schema::SchemaError;
use tagwire_wire::WireError;

/// Top-level error that wraps every layer's errors.
///
/// Application code that builds a schema and then encodes or decodes with
/// it can use this one type and let `?` convert the rest.
#[derive(Debug, thiserror::Error)]
pub enum TagwireError {
    /// The schema was rejected at build time.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Encode, decode, or field access failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A low-level wire error outside of a message decode.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl TagwireError {
    /// Returns `true` if the error means the input bytes were malformed.
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::Codec(err) => err.is_malformed(),
            Self::Wire(_) => true,
            Self::Schema(_) => false,
        }
    }
}

/// Shorthand for results in application code.
pub type Result<T, E = TagwireError> = std::result::Result<T, E>;
