//! Ref-lists and directory listings.
//!
//! A directory-shaped object has two halves: its blob decodes into an
//! ordered list of [`DirectoryEntry`], and a `refs.<id>` side-file holds the
//! children's object ids in the same order.
//!
//! Ref-list layout: byte 0 is the record count `N`, followed by `N` records
//! of [`REF_RECORD_LEN`] bytes. The first two bytes of a record are unused;
//! the remaining 64 are the child's binary digest.

use rsb_codec::{decode_with, DecoderConfig};
use rsb_types::{DirectoryEntry, EntryKind, ObjectId, RawValue, DIGEST_LEN};

use crate::error::{StoreError, StoreResult};

/// Size of one ref-list record.
pub const REF_RECORD_LEN: usize = 2 + DIGEST_LEN;

/// Generation tag given to ids read out of a ref-list.
pub const REF_GENERATION: &str = "0";

/// Parse a ref-list side-file into child object ids.
///
/// The file length must be exactly `1 + N * REF_RECORD_LEN`; anything else
/// is rejected rather than truncated or padded.
pub fn parse_ref_list(id: &ObjectId, bytes: &[u8]) -> StoreResult<Vec<ObjectId>> {
    let corrupt = |reason: String| StoreError::CorruptRefList {
        id: id.clone(),
        reason,
    };

    let (&count, records) = bytes
        .split_first()
        .ok_or_else(|| corrupt("empty ref-list".into()))?;
    let count = usize::from(count);

    let expected = count * REF_RECORD_LEN;
    if records.len() != expected {
        return Err(corrupt(format!(
            "count byte says {count} records ({expected} bytes), found {} bytes",
            records.len()
        )));
    }

    Ok(records
        .chunks_exact(REF_RECORD_LEN)
        .map(|record| {
            let mut digest = [0u8; DIGEST_LEN];
            digest.copy_from_slice(&record[2..]);
            ObjectId::from_digest(REF_GENERATION, &digest)
        })
        .collect())
}

/// Interpret a blob as a directory listing.
///
/// The listing is accepted either as a JSON array of `{name, kind}` objects
/// or as a decoded array whose elements each carry `name` and `kind`
/// scalar fields. Returns `None` if the blob has neither shape.
pub fn parse_directory_listing(data: &[u8], config: &DecoderConfig) -> Option<Vec<DirectoryEntry>> {
    if let Ok(entries) = serde_json::from_slice::<Vec<DirectoryEntry>>(data) {
        return Some(entries);
    }
    let value = decode_with(data, config).ok()?;
    if !value.is_array() {
        return None;
    }
    value.elements().iter().map(entry_from_raw).collect()
}

fn entry_from_raw(value: &RawValue) -> Option<DirectoryEntry> {
    let name = value.field("name")?.scalar_value()?;
    let kind = EntryKind::from_name(value.field("kind")?.scalar_value()?)?;
    Some(DirectoryEntry::new(name, kind))
}

/// Build ref-list file bytes.
///
/// The count is a single byte, so more than 255 digests is an error.
pub fn encode_ref_list(digests: &[[u8; DIGEST_LEN]]) -> StoreResult<Vec<u8>> {
    let count = u8::try_from(digests.len()).map_err(|_| StoreError::TooManyRefs {
        count: digests.len(),
    })?;
    let mut out = Vec::with_capacity(1 + digests.len() * REF_RECORD_LEN);
    out.push(count);
    for digest in digests {
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(digest);
    }
    Ok(out)
}
