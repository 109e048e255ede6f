use std::path::PathBuf;

use kit_types::{ObjectHash, TypeError};

use crate::object::ObjectKind;

/// Errors from object store and codec operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object has no shard file.
    #[error("object not found: {0}")]
    NotFound(ObjectHash),

    /// Underlying filesystem failure.
    #[error("storage error at {}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoded bytes violate the header/body grammar.
    #[error("malformed object: {reason}")]
    Malformed { reason: String },

    /// The object decoded fine but is not the kind the caller needs.
    #[error("object {hash} is a {actual}, expected a {expected}")]
    UnexpectedKind {
        hash: ObjectHash,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// Content hash mismatch on a verifying read.
    #[error("hash mismatch: stored under {expected}, content hashes to {computed}")]
    HashMismatch {
        expected: ObjectHash,
        computed: ObjectHash,
    },

    /// A name that cannot appear in a tree entry.
    #[error("invalid tree entry name {name:?}: {reason}")]
    InvalidEntryName { name: String, reason: &'static str },

    /// A hash string that does not parse.
    #[error("invalid object hash")]
    InvalidHash(#[from] TypeError),
}

impl StoreError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
