use std::collections::HashMap;
use std::sync::RwLock;

use kit_types::ObjectHash;

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Encoded bytes are kept uncompressed
/// behind a `RwLock` for safe concurrent access.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectHash, Vec<u8>>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Return a sorted list of all object hashes in the store.
    pub fn all_hashes(&self) -> Vec<ObjectHash> {
        let map = self.objects.read().expect("lock poisoned");
        let mut hashes: Vec<ObjectHash> = map.keys().copied().collect();
        hashes.sort();
        hashes
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, encoded: &[u8]) -> StoreResult<ObjectHash> {
        let hash = codec::hash(encoded);
        let mut map = self.objects.write().expect("lock poisoned");
        // Same hash means same bytes; keep the first copy.
        map.entry(hash).or_insert_with(|| encoded.to_vec());
        Ok(hash)
    }

    fn get(&self, hash: &ObjectHash) -> StoreResult<Vec<u8>> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(hash).cloned().ok_or(StoreError::NotFound(*hash))
    }

    fn contains(&self, hash: &ObjectHash) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(hash))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}
