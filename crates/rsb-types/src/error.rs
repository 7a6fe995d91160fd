use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id {id:?}: {reason}")]
    InvalidObjectId { id: String, reason: String },

    #[error("invalid base64 digest: {0}")]
    InvalidDigest(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("illegal value shape: {0}")]
    IllegalShape(String),
}
