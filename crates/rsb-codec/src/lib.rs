//! Decoder for the tagged, length-prefixed object format.
//!
//! Objects in a bundle's blob store are serialized as nested containers of
//! length-prefixed tokens. [`decode`] turns one buffer into a
//! [`RawValue`](rsb_types::RawValue) tree in a single pass with no
//! backtracking.
//!
//! # Token grammar
//!
//! ```text
//! value     := container
//! container := '[' ws meta? ws tag? ws item* ws ']'
//! meta      := '^' container            ; `_n` field overrides the type name
//! tag       := 'T' len ':' bytes
//! item      := key ws (container | scalar)
//!            | container                ; array element
//!            | scalar                   ; the container's own leaf value
//! key       := 'K' len ':' bytes
//! scalar    := 'V' len ':' bytes
//! len       := [0-9]+
//! ```
//!
//! Lengths count raw bytes, so token payloads may contain any delimiter.

pub mod config;
pub mod decoder;
pub mod error;

pub use config::DecoderConfig;
pub use decoder::{decode, decode_with};
pub use error::{FormatError, FormatResult};
