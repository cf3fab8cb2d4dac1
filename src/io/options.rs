//! Decode/encode options
//!
//! All options are explicit; nothing degrades gracefully unless the caller
//! asks for it here. Options deserialize from configuration with every
//! key optional.

use serde::{Deserialize, Serialize};

/// Default bound on nesting of containers, records and any-typed data.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// What to do with wire keys that match no declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownAttrs {
    /// Fail with an attribute error
    #[default]
    Reject,
    /// Preserve them as extra attrs on the decoded record
    Keep,
    /// Drop them silently
    Discard,
}

/// Options for decoding and encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoOptions {
    /// Accept wire ints for float fields.
    pub coerce_int_to_float: bool,
    /// Policy for unknown wire keys.
    pub unknown_attrs: UnknownAttrs,
    /// Maximum nesting depth walked before failing.
    pub max_depth: usize,
}

impl Default for IoOptions {
    fn default() -> Self {
        Self {
            coerce_int_to_float: false,
            unknown_attrs: UnknownAttrs::Reject,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl IoOptions {
    /// Strict options (the default).
    pub fn strict() -> Self {
        Self::default()
    }

    /// Options that accept ints as floats and drop unknown keys.
    pub fn lenient() -> Self {
        Self {
            coerce_int_to_float: true,
            unknown_attrs: UnknownAttrs::Discard,
            ..Self::default()
        }
    }

    pub fn with_coerce_int_to_float(mut self, coerce: bool) -> Self {
        self.coerce_int_to_float = coerce;
        self
    }

    pub fn with_unknown_attrs(mut self, policy: UnknownAttrs) -> Self {
        self.unknown_attrs = policy;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
