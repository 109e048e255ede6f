//! Content-addressed object storage for kit.
//!
//! This crate implements a hash-keyed object store laid out like git's
//! `.git/objects/` directory. Every blob, tree and commit is encoded to a
//! canonical byte form, identified by the SHA-1 of those bytes, compressed
//! with zlib and written once.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content (file contents, arbitrary data)
//! - [`Tree`] -- directory listing mapping names to object hashes
//! - [`Commit`] -- a tree snapshot plus parent, identities and message
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`LooseObjectStore`] -- one zlib-compressed file per object, sharded by hash prefix
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. The store never interprets object contents on `put`/`get`; the codec does.
//! 3. Writing the same bytes twice is idempotent.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod codec;
pub mod compress;
pub mod error;
pub mod loose;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use codec::{decode, decode_header, encode, hash, Header};
pub use error::{StoreError, StoreResult};
pub use loose::LooseObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{validate_entry_name, Blob, Commit, EntryMode, Object, ObjectKind, Tree, TreeEntry};
pub use traits::ObjectStore;
