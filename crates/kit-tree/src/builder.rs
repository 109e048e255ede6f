//! Directory-to-tree snapshotting.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::Path;

use kit_store::{validate_entry_name, Blob, EntryMode, Object, ObjectStore, Tree, TreeEntry};
use kit_types::ObjectHash;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::error::{TreeError, TreeResult};

/// Name of the repository metadata directory, never included in snapshots.
pub const METADATA_DIR: &str = ".git";

/// Snapshots a directory into tree and blob objects.
///
/// Each directory becomes a [`Tree`] whose entries are sorted by name before
/// encoding, so the resulting hash depends only on names and contents, never
/// on the order the filesystem lists them in. Subdirectories are stored
/// before their parent, so every tree only references objects that already
/// exist in the store.
///
/// Symlinks to regular files are stored as the target's content; symlinks to
/// directories and anything that is not a file or directory are skipped.
pub struct TreeBuilder<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    excluded: Vec<OsString>,
}

impl<'a, S: ObjectStore + ?Sized> TreeBuilder<'a, S> {
    /// Create a builder writing into `store` that skips [`METADATA_DIR`].
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            excluded: vec![OsString::from(METADATA_DIR)],
        }
    }

    /// Also skip entries with this name, at any depth.
    pub fn exclude(mut self, name: impl Into<OsString>) -> Self {
        self.excluded.push(name.into());
        self
    }

    /// Snapshot `dir` and return the hash of its root tree.
    pub fn build(&self, dir: &Path) -> TreeResult<ObjectHash> {
        let meta = fs::metadata(dir).map_err(|source| TreeError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(TreeError::NotADirectory(dir.to_path_buf()));
        }
        let root = self.build_dir(dir)?;
        debug!(path = %dir.display(), root = %root, "snapshot complete");
        Ok(root)
    }

    fn build_dir(&self, dir: &Path) -> TreeResult<ObjectHash> {
        let mut entries = Vec::new();

        let listing = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for item in listing {
            let item = item.map_err(|e| walk_error(e, dir))?;
            if self.is_excluded(item.file_name()) {
                trace!(path = %item.path().display(), "excluded");
                continue;
            }

            let path = item.path();
            let file_type = item.file_type();
            let (mode, hash) = if file_type.is_dir() {
                (EntryMode::Directory, self.build_dir(path)?)
            } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
                (EntryMode::RegularFile, self.store_file(path)?)
            } else {
                warn!(path = %path.display(), "skipping entry that is neither a file nor a directory");
                continue;
            };
            entries.push(TreeEntry::new(mode, entry_name(path, item.file_name())?, hash));
        }

        let tree = Tree::new(entries)?;
        let count = tree.len();
        let hash = self.store.write_object(&Object::Tree(tree))?;
        debug!(path = %dir.display(), entries = count, hash = %hash, "stored tree");
        Ok(hash)
    }

    fn store_file(&self, path: &Path) -> TreeResult<ObjectHash> {
        let content = fs::read(path).map_err(|source| TreeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let len = content.len();
        let hash = self.store.write_object(&Object::Blob(Blob::new(content)))?;
        trace!(path = %path.display(), len, hash = %hash, "stored blob");
        Ok(hash)
    }

    fn is_excluded(&self, name: &OsStr) -> bool {
        self.excluded.iter().any(|excluded| excluded == name)
    }
}

/// Snapshot `dir` into `store` with the default exclusions.
pub fn build_tree<S: ObjectStore + ?Sized>(store: &S, dir: &Path) -> TreeResult<ObjectHash> {
    TreeBuilder::new(store).build(dir)
}

fn entry_name(path: &Path, file_name: &OsStr) -> TreeResult<String> {
    let name = file_name.to_str().ok_or_else(|| TreeError::UnsupportedName {
        path: path.to_path_buf(),
        reason: "file name is not valid UTF-8".to_string(),
    })?;
    validate_entry_name(name).map_err(|e| TreeError::UnsupportedName {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(name.to_string())
}

fn walk_error(err: walkdir::Error, dir: &Path) -> TreeError {
    let path = err.path().unwrap_or(dir).to_path_buf();
    TreeError::Io {
        path,
        source: err.into(),
    }
}
