//! JSON projections of decoded bundle objects.
//!
//! Three independent transforms over one [`RawValue`](rsb_types::RawValue)
//! tree. Downstream report formats are shape-sensitive, so each projection
//! is kept exact:
//!
//! - [`to_canonical_json`] -- arrays, converted scalars, and plain objects
//! - [`to_legacy_json`] -- every value wrapped with `_type` (and `_supertype`)
//! - [`to_log_json`] -- canonical plus activity-log defaults and reshaping
//!
//! All lookup tables are immutable statics; projections are pure functions.

pub mod canonical;
pub mod legacy;
pub mod log;
pub mod scalar;

pub use canonical::to_canonical_json;
pub use legacy::{supertype_of, to_legacy_json};
pub use log::to_log_json;
pub use scalar::convert_scalar;
