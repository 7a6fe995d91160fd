use std::path::PathBuf;

/// Errors from merging bundles.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Fewer than two bundles were given.
    #[error("merge needs at least two bundles, got {0}")]
    NotEnoughSources(usize),

    /// The output location is already taken.
    #[error("output already exists: {0}")]
    OutputExists(PathBuf),

    /// A source bundle is missing or lacks its database.
    #[error("not a bundle: {0}")]
    NotABundle(PathBuf),

    /// A database could not be opened or its schema read.
    #[error("cannot open schema of {path}: {message}")]
    SchemaOpen { path: PathBuf, message: String },

    /// Two bundles hold different bytes under the same blob name.
    #[error("blob {name} in {bundle} differs from the copy already merged")]
    BlobConflict { name: String, bundle: PathBuf },

    /// A foreign key names a table the output does not have.
    #[error("table {table} references unknown table {target}")]
    UnknownTable { table: String, target: String },

    /// A statement failed while merging rows.
    #[error("SQL error: {0}")]
    Sql(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<rusqlite::Error> for MergeError {
    fn from(e: rusqlite::Error) -> Self {
        MergeError::Sql(e.to_string())
    }
}

/// Result alias for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;
