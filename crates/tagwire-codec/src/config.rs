//! Codec configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// UnrecognizedEnumPolicy
// ---------------------------------------------------------------------------

/// What decode does with an enum field whose integer matches no constant.
///
/// Neither choice is an error; they differ in where the number ends up.
/// Whichever is configured applies to every decode call, so the same input
/// always produces the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrecognizedEnumPolicy {
    /// Move the field's raw key and payload into the unknown-fields buffer
    /// and leave the field as if the occurrence never happened. Re-encoding
    /// still writes the number, after the known fields.
    #[default]
    PreserveAsUnknown,

    /// Keep the raw number in the field as `Value::Enum(n)`. Re-encoding
    /// writes it back in place.
    Retain,
}

// ---------------------------------------------------------------------------
// CodecConfig
// ---------------------------------------------------------------------------

/// Settings for a [`Codec`](crate::Codec).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub unrecognized_enum: UnrecognizedEnumPolicy,

    /// When `true`, decode fills absent optional fields that declare a
    /// default with that default. They are then present, so re-encoding
    /// writes them. Default: `false` (absent stays absent).
    pub populate_defaults: bool,

    /// How many levels of nested messages decode follows before giving up.
    /// Guards against stack exhaustion on hostile input. Default: 100.
    pub recursion_limit: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            unrecognized_enum: UnrecognizedEnumPolicy::default(),
            populate_defaults: false,
            recursion_limit: Self::DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl CodecConfig {
    /// Default for `recursion_limit`, and the fixed limit for typed
    /// messages decoded through [`decode_nested`](crate::decode_nested).
    pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

    /// Upper bound for `recursion_limit`.
    pub const MAX_RECURSION_LIMIT: u32 = 1_000;

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called by [`Codec::with_config`](crate::Codec::with_config).
    /// `recursion_limit` is forced into `1..=MAX_RECURSION_LIMIT`.
    pub fn validated(mut self) -> Self {
        if self.recursion_limit == 0 {
            warn!("recursion_limit of 0 would reject every nested message, using 1");
            self.recursion_limit = 1;
        } else if self.recursion_limit > Self::MAX_RECURSION_LIMIT {
            warn!(
                limit = self.recursion_limit,
                max = Self::MAX_RECURSION_LIMIT,
                "recursion_limit exceeds maximum, clamping"
            );
            self.recursion_limit = Self::MAX_RECURSION_LIMIT;
        }
        self
    }
}
