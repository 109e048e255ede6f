//! Error types for the tree crate.

use std::path::PathBuf;

/// Errors that can occur while building or listing trees.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The path handed to the builder is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Reading the working directory failed.
    #[error("cannot read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file name that cannot be represented in a tree entry.
    #[error("cannot snapshot {}: {reason}", path.display())]
    UnsupportedName { path: PathBuf, reason: String },

    /// Store or codec operation failed.
    #[error(transparent)]
    Store(#[from] kit_store::StoreError),
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
