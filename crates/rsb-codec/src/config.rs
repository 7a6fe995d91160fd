use serde::{Deserialize, Serialize};

/// Default nesting ceiling for decoded containers.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Decoder limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Maximum container nesting. Deeper input fails with
    /// [`FormatError::TooDeep`](crate::FormatError::TooDeep) instead of
    /// exhausting the call stack.
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
