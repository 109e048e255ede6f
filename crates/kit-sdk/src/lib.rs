//! High-level SDK for kit.
//!
//! Provides a unified API over the object store and tree builder, rooted at
//! an explicit repository directory. This is the main entry point for
//! applications embedding kit.

pub mod config;
pub mod error;
pub mod repository;

pub use config::{CoreConfig, RepoConfig, UserConfig};
pub use error::{SdkError, SdkResult};
pub use repository::Repository;

// Re-export key types
pub use kit_store::{Blob, Commit, EntryMode, Header, Object, ObjectKind, Tree, TreeEntry};
pub use kit_tree::EntryLine;
pub use kit_types::{Identity, ObjectHash};
