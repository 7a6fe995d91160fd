//! Foundation types for reading result bundles.
//!
//! This crate provides the identifiers and structural types shared by every
//! other `rsb` crate. It performs no I/O.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Opaque `"<generation>~<digest>"` key addressing one stored blob
//! - [`DirectoryEntry`] / [`EntryKind`] -- One named child of a directory-shaped object
//! - [`RawValue`] -- Decoded generic tree form of a stored object

pub mod entry;
pub mod error;
pub mod object;
pub mod value;

pub use entry::{DirectoryEntry, EntryKind};
pub use error::TypeError;
pub use object::{ObjectId, DIGEST_LEN};
pub use value::{RawValue, ARRAY_TYPE_NAME};
