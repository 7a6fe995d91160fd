//! Depth-first traversal of directory-shaped objects.

use std::path::{Path, PathBuf};

use rsb_types::ObjectId;
use serde::Serialize;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Callbacks for [`walk`]. Paths are relative to the walked root.
pub trait Visitor {
    fn visit_directory(&mut self, path: &Path, id: &ObjectId) -> StoreResult<()>;
    fn visit_file(&mut self, path: &Path, id: &ObjectId, data: Vec<u8>) -> StoreResult<()>;
}

/// Walk the directory tree rooted at `root`, loading every file's bytes.
///
/// Nesting is bounded by the store's decoder depth ceiling.
pub fn walk<S, V>(store: &S, root: &ObjectId, visitor: &mut V) -> StoreResult<()>
where
    S: ObjectStore + ?Sized,
    V: Visitor + ?Sized,
{
    walk_dir(store, root, Path::new(""), 0, visitor)
}

fn walk_dir<S, V>(
    store: &S,
    id: &ObjectId,
    path: &Path,
    depth: usize,
    visitor: &mut V,
) -> StoreResult<()>
where
    S: ObjectStore + ?Sized,
    V: Visitor + ?Sized,
{
    let limit = store.config().decoder.max_depth;
    if depth >= limit {
        return Err(StoreError::TooDeep {
            id: id.clone(),
            limit,
        });
    }

    visitor.visit_directory(path, id)?;
    for child in store.load_directory(id)? {
        check_entry_name(id, &child.entry.name)?;
        let child_path = path.join(&child.entry.name);
        if child.entry.is_directory() {
            walk_dir(store, &child.id, &child_path, depth + 1, visitor)?;
        } else {
            let data = store.load_raw_data(&child.id)?;
            visitor.visit_file(&child_path, &child.id, data)?;
        }
    }
    Ok(())
}

fn check_entry_name(id: &ObjectId, name: &str) -> StoreResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StoreError::InvalidEntryName {
            id: id.clone(),
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Summary of an [`export`] run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub directories: usize,
    pub files: usize,
    pub bytes: u64,
}

/// Materialise a directory object under `dest`.
///
/// `dest` is created if needed. Files are written with their decompressed
/// bytes. Nothing inside the bundle is modified.
pub fn export<S>(store: &S, root: &ObjectId, dest: &Path) -> StoreResult<ExportReport>
where
    S: ObjectStore + ?Sized,
{
    let mut exporter = Exporter {
        dest: dest.to_path_buf(),
        report: ExportReport::default(),
    };
    walk(store, root, &mut exporter)?;
    debug!(
        root = %root.short(),
        files = exporter.report.files,
        bytes = exporter.report.bytes,
        "export complete"
    );
    Ok(exporter.report)
}

struct Exporter {
    dest: PathBuf,
    report: ExportReport,
}

impl Visitor for Exporter {
    fn visit_directory(&mut self, path: &Path, _id: &ObjectId) -> StoreResult<()> {
        let target = self.dest.join(path);
        std::fs::create_dir_all(&target).map_err(|source| StoreError::Io {
            path: target,
            source,
        })?;
        self.report.directories += 1;
        Ok(())
    }

    fn visit_file(&mut self, path: &Path, _id: &ObjectId, data: Vec<u8>) -> StoreResult<()> {
        let target = self.dest.join(path);
        std::fs::write(&target, &data).map_err(|source| StoreError::Io {
            path: target,
            source,
        })?;
        self.report.files += 1;
        self.report.bytes += data.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rsb_codec::DecoderConfig;
    use rsb_types::DIGEST_LEN;

    use super::*;
    use crate::config::StoreConfig;
    use crate::memory::InMemoryObjectStore;
    use crate::refs::encode_ref_list;

    fn digest(n: u8) -> [u8; DIGEST_LEN] {
        [n; DIGEST_LEN]
    }

    fn child(n: u8) -> ObjectId {
        ObjectId::from_digest("0", &digest(n))
    }

    fn tree(store: &InMemoryObjectStore) -> ObjectId {
        let root = ObjectId::parse("0~root").unwrap();
        store.insert_blob(
            root.clone(),
            br#"[{"name":"summary.json","kind":"file"},{"name":"logs","kind":"directory"}]"#
                .to_vec(),
        );
        store.insert_refs(root.clone(), encode_ref_list(&[digest(1), digest(2)]).unwrap());
        store.insert_blob(child(1), b"{\"ok\":true}".to_vec());
        store.insert_blob(child(2), br#"[{"name":"build.log","kind":"file"}]"#.to_vec());
        store.insert_refs(child(2), encode_ref_list(&[digest(3)]).unwrap());
        store.insert_blob(child(3), zstd::bulk::compress(b"compiling...", 0).unwrap());
        root
    }

    #[derive(Default)]
    struct Collect(Vec<String>);

    impl Visitor for Collect {
        fn visit_directory(&mut self, path: &Path, _id: &ObjectId) -> StoreResult<()> {
            self.0.push(format!("d:{}", path.display()));
            Ok(())
        }

        fn visit_file(&mut self, path: &Path, _id: &ObjectId, data: Vec<u8>) -> StoreResult<()> {
            self.0.push(format!("f:{}:{}", path.display(), data.len()));
            Ok(())
        }
    }

    #[test]
    fn walk_is_depth_first_in_listing_order() {
        let store = InMemoryObjectStore::new();
        let root = tree(&store);
        let mut collect = Collect::default();
        walk(&store, &root, &mut collect).unwrap();
        assert_eq!(
            collect.0,
            vec![
                "d:".to_string(),
                "f:summary.json:11".to_string(),
                "d:logs".to_string(),
                "f:logs/build.log:12".to_string(),
            ]
        );
    }

    #[test]
    fn export_writes_decompressed_files() {
        let store = InMemoryObjectStore::new();
        let root = tree(&store);
        let out = tempfile::tempdir().unwrap();

        let report = export(&store, &root, &out.path().join("export")).unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.directories, 2);
        assert_eq!(
            std::fs::read(out.path().join("export/logs/build.log")).unwrap(),
            b"compiling..."
        );
    }

    #[test]
    fn traversal_names_rejected() {
        let store = InMemoryObjectStore::new();
        let root = ObjectId::parse("0~root").unwrap();
        store.insert_blob(root.clone(), br#"[{"name":"..","kind":"file"}]"#.to_vec());
        store.insert_refs(root.clone(), encode_ref_list(&[digest(1)]).unwrap());
        store.insert_blob(child(1), b"x".to_vec());

        let err = walk(&store, &root, &mut Collect::default()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidEntryName { .. }));
    }

    #[test]
    fn self_referencing_directory_hits_depth_ceiling() {
        let config = StoreConfig {
            decoder: DecoderConfig { max_depth: 8 },
            ..StoreConfig::default()
        };
        let store = InMemoryObjectStore::with_config(config);
        let looped = child(7);
        store.insert_blob(looped.clone(), br#"[{"name":"again","kind":"directory"}]"#.to_vec());
        store.insert_refs(looped.clone(), encode_ref_list(&[digest(7)]).unwrap());

        let err = walk(&store, &looped, &mut Collect::default()).unwrap_err();
        assert!(matches!(err, StoreError::TooDeep { limit: 8, .. }));
    }
}
