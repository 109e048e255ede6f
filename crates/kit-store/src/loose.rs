use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use kit_types::ObjectHash;
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::codec;
use crate::compress::{self, DEFAULT_LEVEL};
use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Loose-object store: one zlib-compressed file per object.
///
/// On-disk layout:
/// ```text
/// <objects_dir>/<hash[0..2]>/<hash[2..40]>
/// ```
///
/// Each file holds the zlib stream of the object's canonical encoding.
/// Writes go to a temporary file in the shard directory and are renamed
/// into place, so concurrent writers of the same hash never expose a
/// half-written object and the last rename wins with identical content.
#[derive(Clone, Debug)]
pub struct LooseObjectStore {
    objects_dir: PathBuf,
    compression_level: u32,
}

impl LooseObjectStore {
    /// Open a store rooted at an existing `objects` directory.
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects_dir: objects_dir.into(),
            compression_level: DEFAULT_LEVEL,
        }
    }

    /// Use a different zlib level (0-9) for subsequent writes.
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    /// The directory holding the shard directories.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Path of the file that holds (or would hold) `hash`.
    pub fn object_path(&self, hash: &ObjectHash) -> PathBuf {
        let (dir, file) = hash.shard_parts();
        self.objects_dir.join(dir).join(file)
    }

    /// All hashes currently stored, sorted.
    pub fn list(&self) -> StoreResult<Vec<ObjectHash>> {
        let mut hashes = Vec::new();
        let shards = fs::read_dir(&self.objects_dir)
            .map_err(|e| StoreError::storage(&self.objects_dir, e))?;
        for shard in shards {
            let shard = shard.map_err(|e| StoreError::storage(&self.objects_dir, e))?;
            let shard_name = shard.file_name();
            let Some(prefix) = shard_name.to_str().filter(|s| s.len() == 2) else {
                continue;
            };
            let shard_path = shard.path();
            if !shard_path.is_dir() {
                continue;
            }
            let files = fs::read_dir(&shard_path).map_err(|e| StoreError::storage(&shard_path, e))?;
            for file in files {
                let file = file.map_err(|e| StoreError::storage(&shard_path, e))?;
                let file_name = file.file_name();
                let Some(rest) = file_name.to_str() else {
                    continue;
                };
                // Leftover temp files and anything else that is not a hash are ignored.
                if let Ok(hash) = ObjectHash::from_hex(&format!("{prefix}{rest}")) {
                    hashes.push(hash);
                }
            }
        }
        hashes.sort();
        Ok(hashes)
    }
}

impl ObjectStore for LooseObjectStore {
    fn put(&self, encoded: &[u8]) -> StoreResult<ObjectHash> {
        let hash = codec::hash(encoded);
        let path = self.object_path(&hash);
        let shard_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.objects_dir.clone());

        let compressed = compress::compress(encoded, self.compression_level)
            .map_err(|e| StoreError::storage(&path, e))?;

        fs::create_dir_all(&shard_dir).map_err(|e| StoreError::storage(&shard_dir, e))?;
        let mut tmp = NamedTempFile::new_in(&shard_dir).map_err(|e| StoreError::storage(&shard_dir, e))?;
        tmp.write_all(&compressed)
            .map_err(|e| StoreError::storage(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::storage(&path, e.error))?;

        debug!(hash = %hash, len = encoded.len(), compressed = compressed.len(), "stored object");
        Ok(hash)
    }

    fn get(&self, hash: &ObjectHash) -> StoreResult<Vec<u8>> {
        let path = self.object_path(hash);
        let compressed = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound(*hash)),
            Err(e) => return Err(StoreError::storage(path, e)),
        };
        let encoded = compress::decompress(&compressed).map_err(|e| StoreError::Malformed {
            reason: format!("object {hash} is not a valid zlib stream: {e}"),
        })?;
        trace!(hash = %hash, len = encoded.len(), "read object");
        Ok(encoded)
    }

    fn contains(&self, hash: &ObjectHash) -> StoreResult<bool> {
        let path = self.object_path(hash);
        path.try_exists().map_err(|e| StoreError::storage(path, e))
    }
}
