//! Working-directory snapshots for kit.
//!
//! Turns a directory on disk into a graph of tree and blob objects, and reads
//! stored trees back as entry lists.
//!
//! # Key Types
//!
//! - [`TreeBuilder`] -- recursive directory-to-tree snapshotting
//! - [`list_tree`] -- decode a stored tree into its entries
//! - [`EntryLine`] -- `ls-tree` style rendering of one entry

pub mod builder;
pub mod error;
pub mod reader;

pub use builder::{build_tree, TreeBuilder, METADATA_DIR};
pub use error::{TreeError, TreeResult};
pub use reader::{list_tree, list_tree_names, EntryLine};
