use std::collections::HashMap;
use std::sync::RwLock;

use rsb_types::ObjectId;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Blobs and ref-lists are held behind a
/// `RwLock` and cloned on read. Population happens through the inherent
/// `insert_*` methods; the [`ObjectStore`] surface stays read-only.
pub struct InMemoryObjectStore {
    config: StoreConfig,
    blobs: RwLock<HashMap<ObjectId, Vec<u8>>>,
    refs: RwLock<HashMap<ObjectId, Vec<u8>>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            blobs: RwLock::new(HashMap::new()),
            refs: RwLock::new(HashMap::new()),
        }
    }

    /// Store blob bytes exactly as they would sit on disk.
    pub fn insert_blob(&self, id: ObjectId, data: Vec<u8>) {
        self.blobs.write().expect("lock poisoned").insert(id, data);
    }

    /// Store ref-list bytes for a directory-shaped object.
    pub fn insert_refs(&self, id: ObjectId, data: Vec<u8>) {
        self.refs.write().expect("lock poisoned").insert(id, data);
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn read_blob(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let map = self.blobs.read().expect("lock poisoned");
        map.get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn read_refs(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let map = self.refs.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
