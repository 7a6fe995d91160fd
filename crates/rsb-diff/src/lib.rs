//! Structural diff engine for result bundles.
//!
//! Diffing is a multiset set-difference over signed collections: each item
//! is keyed by a signature string and matched at most once against the
//! other side. It is total for any input; there is no error type.
//!
//! # Key Types
//!
//! - [`DiffResult`] / [`diff_by`] -- generic `introduced` / `resolved` split
//! - [`BundleSummary`] / [`compare`] -- tests, failures and located build issues

pub mod compare;
pub mod engine;

pub use compare::{
    compare, diff_failures, diff_issues, diff_tests, BuildIssue, BundleComparison, BundleSummary,
    SourceLocation, TestExecution, TestFailure,
};
pub use engine::{diff_by, DiffResult};
