use std::path::PathBuf;

use rsb_codec::FormatError;
use rsb_types::{ObjectId, TypeError};

/// Errors from frame decompression.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The frame header could not be read or declares an unusable size.
    #[error("bad frame header: {0}")]
    BadHeader(String),

    /// The codec rejected the frame body.
    #[error("corrupt frame: {0}")]
    Corrupt(String),

    /// The decompressed length disagrees with the declared content size.
    #[error("declared content size {declared}, decompressed {actual} bytes")]
    SizeMismatch { declared: u64, actual: usize },
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The bundle root or its data directory does not exist.
    #[error("bundle root not found: {}", .0.display())]
    MissingRoot(PathBuf),

    /// No blob exists for the requested object.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// A blob or side-file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blob is not a valid token stream.
    #[error("malformed object {id}: {source}")]
    Format {
        id: ObjectId,
        #[source]
        source: FormatError,
    },

    /// The blob's compressed frame could not be decoded.
    #[error("cannot decompress object {id}: {source}")]
    Codec {
        id: ObjectId,
        #[source]
        source: CodecError,
    },

    /// Directory listing and ref-list disagree on the number of children.
    #[error("directory {id} lists {entries} entries but its ref-list holds {refs}")]
    RefCountMismatch {
        id: ObjectId,
        entries: usize,
        refs: usize,
    },

    /// The ref-list side-file is structurally invalid.
    #[error("corrupt ref-list for {id}: {reason}")]
    CorruptRefList { id: ObjectId, reason: String },

    /// A ref-list cannot hold more than 255 records.
    #[error("ref-list cannot hold {count} records")]
    TooManyRefs { count: usize },

    /// The object is not shaped like a directory.
    #[error("object {id} is not a directory: {reason}")]
    NotADirectory { id: ObjectId, reason: String },

    /// A directory entry name cannot be used as a path component.
    #[error("invalid entry name {name:?} in directory {id}")]
    InvalidEntryName { id: ObjectId, name: String },

    /// Directory nesting exceeded the configured ceiling.
    #[error("directory nesting deeper than {limit} below {id}")]
    TooDeep { id: ObjectId, limit: usize },

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
