use kit_types::ObjectHash;

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::object::Object;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written: the same bytes always produce the
///   same hash, and a hash is only ever stored with the bytes it was
///   computed from.
/// - `put` is idempotent and safe to call concurrently, including for the
///   same hash.
/// - The store never interprets object contents; decoding is the codec's job.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Store already-encoded object bytes and return their hash.
    fn put(&self, encoded: &[u8]) -> StoreResult<ObjectHash>;

    /// Return the encoded bytes stored under `hash`.
    ///
    /// Fails with [`StoreError::NotFound`] if nothing is stored there. The
    /// content is not re-hashed; see [`ObjectStore::get_verified`].
    fn get(&self, hash: &ObjectHash) -> StoreResult<Vec<u8>>;

    /// Check whether an object exists in the store.
    fn contains(&self, hash: &ObjectHash) -> StoreResult<bool>;

    /// Like [`ObjectStore::get`], but re-hash the content and fail with
    /// [`StoreError::HashMismatch`] if it does not match `hash`.
    fn get_verified(&self, hash: &ObjectHash) -> StoreResult<Vec<u8>> {
        let encoded = self.get(hash)?;
        let computed = codec::hash(&encoded);
        if computed != *hash {
            return Err(StoreError::HashMismatch {
                expected: *hash,
                computed,
            });
        }
        Ok(encoded)
    }

    /// Encode and store an object.
    fn write_object(&self, object: &Object) -> StoreResult<ObjectHash> {
        self.put(&codec::encode(object))
    }

    /// Fetch and decode an object.
    fn read_object(&self, hash: &ObjectHash) -> StoreResult<Object> {
        codec::decode(&self.get(hash)?)
    }
}
