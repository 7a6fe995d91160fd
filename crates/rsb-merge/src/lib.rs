//! Merge engine for result bundles.
//!
//! Combines N bundles into one: the first is copied as the base, then each
//! further bundle's blob directory is unioned in (identical names must hold
//! identical bytes) and its database rows are appended with rowids and
//! foreign keys shifted past the output's existing ids.
//!
//! # Layers
//!
//! - [`plan`] -- pure row remapping, no database access
//! - [`schema`] / [`database`] -- `rusqlite` introspection and the
//!   per-source transaction
//! - [`blobs`] / [`info`] -- filesystem side of the bundle
//! - [`merge_bundles`] -- orchestration

pub mod blobs;
pub mod database;
pub mod engine;
pub mod error;
pub mod info;
pub mod plan;
pub mod schema;

pub use blobs::BlobStats;
pub use engine::{merge_bundles, MergeOptions, MergeReport};
pub use error::{MergeError, MergeResult};
pub use plan::{plan_table_rows, ForeignKey, HighWaterMarks, SourceRow, SqlValue, TableSchema};
