use serde::{Deserialize, Serialize};
use kit_types::{Identity, ObjectHash};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Raw content (file contents, arbitrary data).
    Blob,
    /// Directory listing: sorted entries mapping names to object hashes.
    Tree,
    /// Snapshot reference with lineage and message.
    Commit,
}

impl ObjectKind {
    /// The ASCII token used in the object header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    /// Parse a header token.
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            b"blob" => Some(Self::Blob),
            b"tree" => Some(Self::Tree),
            b"commit" => Some(Self::Commit),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blob {
    pub content: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file.
    #[serde(rename = "100644")]
    RegularFile,
    /// Subtree / directory.
    #[serde(rename = "40000")]
    Directory,
}

impl EntryMode {
    /// Mode string exactly as it appears in an encoded tree.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegularFile => "100644",
            Self::Directory => "40000",
        }
    }

    /// Parse the mode string of an encoded tree entry.
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            b"100644" => Some(Self::RegularFile),
            b"40000" => Some(Self::Directory),
            _ => None,
        }
    }

    /// Kind of object an entry with this mode points at.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            Self::RegularFile => ObjectKind::Blob,
            Self::Directory => ObjectKind::Tree,
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `name` can be stored as a single tree entry name.
pub fn validate_entry_name(name: &str) -> StoreResult<()> {
    let reason = if name.is_empty() {
        "empty name"
    } else if name.contains('\0') {
        "contains NUL"
    } else if name.contains('/') {
        "contains '/'"
    } else if name == "." || name == ".." {
        "reserved name"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidEntryName {
        name: name.to_string(),
        reason,
    })
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub hash: ObjectHash,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, hash: ObjectHash) -> Self {
        Self {
            mode,
            name: name.into(),
            hash,
        }
    }

    /// Kind of the referenced object, derived from the mode.
    pub fn kind(&self) -> ObjectKind {
        self.mode.object_kind()
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    // Byte-wise name order.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.as_bytes().cmp(other.name.as_bytes())
    }
}

/// Directory listing object.
///
/// Trees built with [`Tree::new`] hold valid, distinct names in byte order.
/// Trees decoded from the store keep their stored order so they re-encode to
/// the same bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries.
    ///
    /// Entries are sorted by name for deterministic hashing. Fails with
    /// [`StoreError::InvalidEntryName`] if a name is not a valid entry name
    /// or appears twice.
    pub fn new(mut entries: Vec<TreeEntry>) -> StoreResult<Self> {
        for entry in &entries {
            validate_entry_name(&entry.name)?;
        }
        entries.sort();
        if let Some(pair) = entries.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(StoreError::InvalidEntryName {
                name: pair[0].name.clone(),
                reason: "duplicate name",
            });
        }
        Ok(Self { entries })
    }

    /// Wrap entries exactly as they were decoded.
    pub(crate) fn from_stored(entries: Vec<TreeEntry>) -> Self {
        Self { entries }
    }

    /// Entries in encoding order.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TreeEntry> {
        self.entries
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A point-in-time snapshot reference plus lineage and message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectHash,
    pub parent: Option<ObjectHash>,
    pub author: Identity,
    pub committer: Identity,
    /// Free text, stored verbatim.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// Any storable object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
        }
    }

    /// Unwrap a tree, or report what was found instead.
    pub fn into_tree(self, hash: ObjectHash) -> StoreResult<Tree> {
        match self {
            Self::Tree(tree) => Ok(tree),
            other => Err(other.unexpected(hash, ObjectKind::Tree)),
        }
    }

    /// Unwrap a commit, or report what was found instead.
    pub fn into_commit(self, hash: ObjectHash) -> StoreResult<Commit> {
        match self {
            Self::Commit(commit) => Ok(commit),
            other => Err(other.unexpected(hash, ObjectKind::Commit)),
        }
    }

    /// Unwrap a blob, or report what was found instead.
    pub fn into_blob(self, hash: ObjectHash) -> StoreResult<Blob> {
        match self {
            Self::Blob(blob) => Ok(blob),
            other => Err(other.unexpected(hash, ObjectKind::Blob)),
        }
    }

    fn unexpected(&self, hash: ObjectHash, expected: ObjectKind) -> StoreError {
        StoreError::UnexpectedKind {
            hash,
            expected,
            actual: self.kind(),
        }
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<Tree> for Object {
    fn from(tree: Tree) -> Self {
        Self::Tree(tree)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Self::Commit(commit)
    }
}
