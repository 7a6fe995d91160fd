use rsb_codec::decode_with;
use rsb_types::{DirectoryEntry, ObjectId, RawValue};
use tracing::debug;

use crate::compression::{is_zstd_frame, maybe_decompress};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::refs::{parse_directory_listing, parse_ref_list};

/// One child of a resolved directory: its listing entry and its object id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryChild {
    pub entry: DirectoryEntry,
    pub id: ObjectId,
}

/// An object interpreted by shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Directory(Vec<DirectoryChild>),
    Object(RawValue),
    Raw(Vec<u8>),
}

/// Read-only access to a bundle's blob store.
///
/// Backends supply the two file reads; everything above them (frame
/// decompression, decoding, ref-chasing) is shared. Invariants:
/// - The store never writes. Objects are immutable and externally assigned.
/// - Every call is independent; nothing is cached between calls.
/// - Errors are terminal for the call that raised them; nothing is retried.
pub trait ObjectStore: Send + Sync {
    /// Store configuration (layout and decoder limits).
    fn config(&self) -> &StoreConfig;

    /// Read the stored bytes of `data.<id>` as they are on disk.
    ///
    /// Returns `Err(StoreError::NotFound)` if no such blob exists.
    fn read_blob(&self, id: &ObjectId) -> StoreResult<Vec<u8>>;

    /// Read `refs.<id>`, or `Ok(None)` if the object has no ref-list.
    fn read_refs(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>>;

    /// Check whether a blob exists for `id`.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Load an object's bytes, decompressing a zstd frame if present.
    fn load_raw_data(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let stored = self.read_blob(id)?;
        let compressed = is_zstd_frame(&stored);
        let stored_len = stored.len();
        let data = maybe_decompress(stored).map_err(|source| StoreError::Codec {
            id: id.clone(),
            source,
        })?;
        debug!(id = %id.short(), stored_len, len = data.len(), compressed, "loaded blob");
        Ok(data)
    }

    /// Load and decode an object into a raw value tree.
    fn load_object(&self, id: &ObjectId) -> StoreResult<RawValue> {
        let data = self.load_raw_data(id)?;
        decode_with(&data, &self.config().decoder).map_err(|source| StoreError::Format {
            id: id.clone(),
            source,
        })
    }

    /// Load the child ids from an object's ref-list.
    fn load_refs(&self, id: &ObjectId) -> StoreResult<Vec<ObjectId>> {
        let bytes = self.read_refs(id)?.ok_or_else(|| StoreError::NotADirectory {
            id: id.clone(),
            reason: "no ref-list".into(),
        })?;
        parse_ref_list(id, &bytes)
    }

    /// Load a directory object, pairing listing entries with ref-list ids.
    fn load_directory(&self, id: &ObjectId) -> StoreResult<Vec<DirectoryChild>> {
        let refs = self.load_refs(id)?;
        let data = self.load_raw_data(id)?;
        let entries = parse_directory_listing(&data, &self.config().decoder).ok_or_else(|| {
            StoreError::NotADirectory {
                id: id.clone(),
                reason: "blob is not a directory listing".into(),
            }
        })?;
        pair_children(id, entries, refs)
    }

    /// Interpret an object by shape.
    ///
    /// Tried in order: a directory (ref-list present and the blob is a
    /// listing), a decodable object, and finally the raw bytes. The format
    /// carries no discriminator, so this order is fixed. A directory whose
    /// entry and ref counts disagree is an error, not a fallback.
    fn resolve(&self, id: &ObjectId) -> StoreResult<Node> {
        let data = self.load_raw_data(id)?;
        let config = self.config();

        if let Some(refs_bytes) = self.read_refs(id)? {
            if let Some(entries) = parse_directory_listing(&data, &config.decoder) {
                let refs = parse_ref_list(id, &refs_bytes)?;
                debug!(id = %id.short(), children = refs.len(), "resolved directory");
                return pair_children(id, entries, refs).map(Node::Directory);
            }
        }

        match decode_with(&data, &config.decoder) {
            Ok(value) => Ok(Node::Object(value)),
            Err(e) => {
                debug!(id = %id.short(), error = %e, "not a decodable object; returning raw bytes");
                Ok(Node::Raw(data))
            }
        }
    }
}

fn pair_children(
    id: &ObjectId,
    entries: Vec<DirectoryEntry>,
    refs: Vec<ObjectId>,
) -> StoreResult<Vec<DirectoryChild>> {
    if entries.len() != refs.len() {
        return Err(StoreError::RefCountMismatch {
            id: id.clone(),
            entries: entries.len(),
            refs: refs.len(),
        });
    }
    Ok(entries
        .into_iter()
        .zip(refs)
        .map(|(entry, id)| DirectoryChild { entry, id })
        .collect())
}
