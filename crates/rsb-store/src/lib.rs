//! Content-addressed object store for result bundles.
//!
//! A bundle keeps every object as an immutable blob named after its
//! [`ObjectId`](rsb_types::ObjectId) under a data directory. This crate
//! resolves ids to bytes or decoded trees, decompresses zstd frames, and
//! chases directory ref-lists.
//!
//! # Backends
//!
//! All backends implement the read-only [`ObjectStore`] trait:
//!
//! - [`BundleStore`] -- files under `<bundle>/Data`
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. The store never writes into a bundle.
//! 2. Calls are stateless: nothing decoded is cached between calls.
//! 3. Directory entries and ref-list ids pair index-for-index; a count
//!    mismatch is fatal, never truncated or padded.
//! 4. Decompression and decoding failures are terminal for the object.

pub mod bundle;
pub mod compression;
pub mod config;
pub mod error;
pub mod memory;
pub mod refs;
pub mod traits;
pub mod walk;

// Re-export primary types at crate root for ergonomic imports.
pub use bundle::BundleStore;
pub use compression::{decompress_frame, frame_content_size, is_zstd_frame, ZSTD_MAGIC};
pub use config::{BundleLayout, StoreConfig};
pub use error::{CodecError, CodecResult, StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use refs::{encode_ref_list, parse_directory_listing, parse_ref_list, REF_RECORD_LEN};
pub use traits::{DirectoryChild, Node, ObjectStore};
pub use walk::{export, walk, ExportReport, Visitor};
