//! Listing stored trees.

use std::fmt;

use kit_store::{ObjectStore, TreeEntry};
use kit_types::ObjectHash;

use crate::error::TreeResult;

/// Load the tree stored under `hash` and return its entries in stored order.
///
/// Fails with `UnexpectedKind` if the object is not a tree.
pub fn list_tree<S: ObjectStore + ?Sized>(store: &S, hash: &ObjectHash) -> TreeResult<Vec<TreeEntry>> {
    let tree = store.read_object(hash)?.into_tree(*hash)?;
    Ok(tree.into_entries())
}

/// Names-only projection of [`list_tree`].
pub fn list_tree_names<S: ObjectStore + ?Sized>(store: &S, hash: &ObjectHash) -> TreeResult<Vec<String>> {
    Ok(list_tree(store, hash)?.into_iter().map(|e| e.name).collect())
}

/// Renders an entry as `<mode> <kind> <hash>\t<name>`.
pub struct EntryLine<'a>(pub &'a TreeEntry);

impl fmt::Display for EntryLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.0;
        write!(f, "{} {} {}\t{}", entry.mode, entry.kind(), entry.hash, entry.name)
    }
}
