use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rsb_types::ObjectId;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Filesystem object store rooted at a bundle directory.
///
/// Blobs live at `<bundle>/<data_dir>/data.<id>` and ref-lists beside them
/// at `refs.<id>`.
#[derive(Debug, Clone)]
pub struct BundleStore {
    root: PathBuf,
    data_dir: PathBuf,
    config: StoreConfig,
}

impl BundleStore {
    /// Open a bundle with the default layout.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(root, StoreConfig::default())
    }

    /// Open a bundle with an explicit configuration.
    pub fn open_with(root: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StoreError::MissingRoot(root));
        }
        let data_dir = config.layout.data_path(&root);
        if !data_dir.is_dir() {
            return Err(StoreError::MissingRoot(data_dir));
        }
        debug!(root = %root.display(), "opened bundle store");
        Ok(Self {
            root,
            data_dir,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn blob_path(&self, id: &ObjectId) -> PathBuf {
        self.data_dir.join(id.blob_file_name())
    }

    pub fn refs_path(&self, id: &ObjectId) -> PathBuf {
        self.data_dir.join(id.refs_file_name())
    }
}

impl ObjectStore for BundleStore {
    fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn read_blob(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let path = self.blob_path(id);
        std::fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StoreError::NotFound(id.clone()),
            _ => StoreError::Io { path, source },
        })
    }

    fn read_refs(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let path = self.refs_path(id);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.blob_path(id).is_file())
    }
}
