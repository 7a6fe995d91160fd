use std::path::{Path, PathBuf};

use rsb_codec::DecoderConfig;
use serde::{Deserialize, Serialize};

/// File and directory names inside a bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleLayout {
    /// Subdirectory holding `data.<id>` blobs and `refs.<id>` ref-lists.
    pub data_dir: String,
    /// Relational database file at the bundle root.
    pub database_file: String,
    /// Metadata property list at the bundle root.
    pub info_file: String,
}

impl Default for BundleLayout {
    fn default() -> Self {
        Self {
            data_dir: "Data".into(),
            database_file: "database.sqlite3".into(),
            info_file: "Info.plist".into(),
        }
    }
}

impl BundleLayout {
    pub fn data_path(&self, bundle: &Path) -> PathBuf {
        bundle.join(&self.data_dir)
    }

    pub fn database_path(&self, bundle: &Path) -> PathBuf {
        bundle.join(&self.database_file)
    }

    pub fn info_path(&self, bundle: &Path) -> PathBuf {
        bundle.join(&self.info_file)
    }
}

/// Configuration for opening an object store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub layout: BundleLayout,
    pub decoder: DecoderConfig,
}
