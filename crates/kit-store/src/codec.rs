//! Canonical byte encoding of objects.
//!
//! Every object is `<kind> <body-len>\0<body>`. The hash of an object is the
//! SHA-1 of exactly these bytes, so the layout below is the on-disk format
//! and must stay bit-exact.
//!
//! ```text
//! blob   body: raw content
//! tree   body: repeated  <mode> <name>\0<20 raw hash bytes>   (sorted by name)
//! commit body: tree <hex>\n[parent <hex>\n]author <id>\ncommitter <id>\n\n<message>
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Write;

use kit_types::{Identity, ObjectHash, HASH_LEN};

use crate::error::{StoreError, StoreResult};
use crate::object::{
    validate_entry_name, Blob, Commit, EntryMode, Object, ObjectKind, Tree, TreeEntry,
};

/// Older objects spell the committer label this way; accepted on decode only.
const LEGACY_COMMITTER_LABEL: &str = "commiter";

/// Parsed object header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub kind: ObjectKind,
    /// Declared body length in bytes.
    pub size: usize,
}

/// Encode an object to its canonical bytes (header followed by body).
pub fn encode(object: &Object) -> Vec<u8> {
    let body = encode_body(object);
    let mut out = Vec::with_capacity(body.len() + 16);
    // Writing into a Vec cannot fail.
    let _ = write!(out, "{} {}\0", object.kind(), body.len());
    out.extend_from_slice(&body);
    out
}

/// Hash canonical object bytes.
pub fn hash(encoded: &[u8]) -> ObjectHash {
    ObjectHash::digest(encoded)
}

fn encode_body(object: &Object) -> Cow<'_, [u8]> {
    match object {
        Object::Blob(blob) => Cow::Borrowed(&blob.content),
        Object::Tree(tree) => Cow::Owned(encode_tree_body(tree)),
        Object::Commit(commit) => Cow::Owned(encode_commit_body(commit).into_bytes()),
    }
}

fn encode_tree_body(tree: &Tree) -> Vec<u8> {
    let mut body = Vec::new();
    for entry in tree.entries() {
        body.extend_from_slice(entry.mode.as_str().as_bytes());
        body.push(b' ');
        body.extend_from_slice(entry.name.as_bytes());
        body.push(0);
        body.extend_from_slice(entry.hash.as_bytes());
    }
    body
}

fn encode_commit_body(commit: &Commit) -> String {
    let mut body = format!("tree {}\n", commit.tree);
    if let Some(parent) = &commit.parent {
        body.push_str(&format!("parent {parent}\n"));
    }
    body.push_str(&format!("author {}\n", commit.author));
    body.push_str(&format!("committer {}\n", commit.committer));
    body.push('\n');
    body.push_str(&commit.message);
    body
}

/// Split encoded bytes into a validated header and the body.
///
/// Fails with [`StoreError::Malformed`] when the NUL terminator is missing,
/// the kind token is unknown, the length is not canonical decimal, or the
/// declared length differs from the body.
pub fn decode_header(encoded: &[u8]) -> StoreResult<(Header, &[u8])> {
    let nul = encoded
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| StoreError::malformed("header is not NUL-terminated"))?;
    let (header, body) = (&encoded[..nul], &encoded[nul + 1..]);

    let space = header
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| StoreError::malformed("header has no space after kind"))?;
    let (token, digits) = (&header[..space], &header[space + 1..]);

    let kind = ObjectKind::from_token(token).ok_or_else(|| {
        StoreError::malformed(format!(
            "unknown object kind {:?}",
            String::from_utf8_lossy(token)
        ))
    })?;

    let leading_zero = digits.len() > 1 && digits[0] == b'0';
    if digits.is_empty() || leading_zero || !digits.iter().all(u8::is_ascii_digit) {
        return Err(StoreError::malformed(format!(
            "invalid length {:?}",
            String::from_utf8_lossy(digits)
        )));
    }
    let size: usize = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| StoreError::malformed("length out of range"))?;

    if size != body.len() {
        return Err(StoreError::malformed(format!(
            "declared length {size} but body has {} bytes",
            body.len()
        )));
    }

    Ok((Header { kind, size }, body))
}

/// Decode canonical bytes back into an object.
pub fn decode(encoded: &[u8]) -> StoreResult<Object> {
    let (header, body) = decode_header(encoded)?;
    match header.kind {
        ObjectKind::Blob => Ok(Object::Blob(Blob::new(body))),
        ObjectKind::Tree => decode_tree_body(body).map(Object::Tree),
        ObjectKind::Commit => decode_commit_body(body).map(Object::Commit),
    }
}

fn decode_tree_body(body: &[u8]) -> StoreResult<Tree> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut rest = body;

    while !rest.is_empty() {
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| StoreError::malformed("tree entry is not NUL-terminated"))?;
        let (mode_name, after) = (&rest[..nul], &rest[nul + 1..]);

        let space = mode_name
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| StoreError::malformed("tree entry has no space between mode and name"))?;
        let mode = EntryMode::from_token(&mode_name[..space]).ok_or_else(|| {
            StoreError::malformed(format!(
                "unknown tree entry mode {:?}",
                String::from_utf8_lossy(&mode_name[..space])
            ))
        })?;
        let name = std::str::from_utf8(&mode_name[space + 1..])
            .map_err(|_| StoreError::malformed("tree entry name is not UTF-8"))?;
        validate_entry_name(name).map_err(|e| StoreError::malformed(e.to_string()))?;
        if !seen.insert(name) {
            return Err(StoreError::malformed(format!(
                "tree has more than one entry named {name:?}"
            )));
        }

        if after.len() < HASH_LEN {
            return Err(StoreError::malformed(format!(
                "tree entry {name:?} has {} hash bytes, need {HASH_LEN}",
                after.len()
            )));
        }
        let hash = ObjectHash::from_slice(&after[..HASH_LEN])?;

        entries.push(TreeEntry::new(mode, name, hash));
        rest = &after[HASH_LEN..];
    }

    // Stored order is kept as-is.
    Ok(Tree::from_stored(entries))
}

fn decode_commit_body(body: &[u8]) -> StoreResult<Commit> {
    let text = std::str::from_utf8(body)
        .map_err(|_| StoreError::malformed("commit body is not UTF-8"))?;
    let (headers, message) = text
        .split_once("\n\n")
        .ok_or_else(|| StoreError::malformed("commit has no blank line before message"))?;

    let mut tree = None;
    let mut parent = None;
    let mut author = None;
    let mut committer = None;

    for line in headers.split('\n') {
        let (label, value) = line
            .split_once(' ')
            .ok_or_else(|| StoreError::malformed(format!("commit header line {line:?}")))?;
        let slot_taken = match label {
            "tree" => tree.replace(parse_hash(value)?).is_some(),
            "parent" => parent.replace(parse_hash(value)?).is_some(),
            "author" => author.replace(parse_identity(value)?).is_some(),
            "committer" | LEGACY_COMMITTER_LABEL => {
                committer.replace(parse_identity(value)?).is_some()
            }
            other => {
                return Err(StoreError::malformed(format!(
                    "unknown commit header {other:?}"
                )))
            }
        };
        if slot_taken {
            return Err(StoreError::malformed(format!(
                "duplicate commit header {label:?}"
            )));
        }
    }

    let missing = |what: &str| StoreError::malformed(format!("commit has no {what} line"));
    Ok(Commit {
        tree: tree.ok_or_else(|| missing("tree"))?,
        parent,
        author: author.ok_or_else(|| missing("author"))?,
        committer: committer.ok_or_else(|| missing("committer"))?,
        message: message.to_string(),
    })
}

fn parse_hash(value: &str) -> StoreResult<ObjectHash> {
    ObjectHash::from_hex(value)
        .map_err(|e| StoreError::malformed(format!("bad hash {value:?}: {e}")))
}

fn parse_identity(value: &str) -> StoreResult<Identity> {
    value
        .parse()
        .map_err(|e| StoreError::malformed(format!("bad identity {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

    fn ada() -> Identity {
        Identity::new("Ada Lovelace", "ada@example.com", 1_700_000_000, 60).unwrap()
    }

    fn hex(s: &str) -> ObjectHash {
        ObjectHash::from_hex(s).unwrap()
    }

    fn sample_commit(parent: Option<ObjectHash>) -> Commit {
        Commit {
            tree: hex(EMPTY_TREE),
            parent,
            author: ada(),
            committer: ada(),
            message: "initial commit\n".into(),
        }
    }

    fn assert_malformed(bytes: &[u8]) {
        match decode(bytes) {
            Err(StoreError::Malformed { .. }) => {}
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Encoding layout
    // -----------------------------------------------------------------------

    #[test]
    fn blob_encoding_is_header_plus_content() {
        let encoded = encode(&Object::Blob(Blob::new("hello")));
        assert_eq!(encoded, b"blob 5\0hello");
    }

    #[test]
    fn blob_hash_matches_known_value() {
        let encoded = encode(&Object::Blob(Blob::new("Hello, World!")));
        assert_eq!(
            hash(&encoded).to_hex(),
            "b45ef6fec89518d314f546fd6c3025367b721684"
        );
    }

    #[test]
    fn empty_blob_is_legal() {
        let encoded = encode(&Object::Blob(Blob::default()));
        assert_eq!(encoded, b"blob 0\0");
        assert_eq!(decode(&encoded).unwrap(), Object::Blob(Blob::default()));
    }

    #[test]
    fn empty_tree_hash_matches_known_value() {
        let encoded = encode(&Object::Tree(Tree::empty()));
        assert_eq!(encoded, b"tree 0\0");
        assert_eq!(hash(&encoded).to_hex(), EMPTY_TREE);
    }

    #[test]
    fn tree_body_uses_raw_hash_bytes_in_name_order() {
        let a = ObjectHash::from_raw([0xaa; 20]);
        let b = ObjectHash::from_raw([0xbb; 20]);
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::Directory, "sub", b),
            TreeEntry::new(EntryMode::RegularFile, "hello.txt", a),
        ])
        .unwrap();
        let encoded = encode(&Object::Tree(tree));

        let mut expected_body = b"100644 hello.txt\0".to_vec();
        expected_body.extend_from_slice(&[0xaa; 20]);
        expected_body.extend_from_slice(b"40000 sub\0");
        expected_body.extend_from_slice(&[0xbb; 20]);
        let mut expected = format!("tree {}\0", expected_body.len()).into_bytes();
        expected.extend_from_slice(&expected_body);

        assert_eq!(encoded, expected);
    }

    #[test]
    fn tree_hash_does_not_depend_on_input_order() {
        let z = TreeEntry::new(EntryMode::RegularFile, "z", ObjectHash::from_raw([1; 20]));
        let a = TreeEntry::new(EntryMode::RegularFile, "a", ObjectHash::from_raw([2; 20]));
        let forward = Tree::new(vec![a.clone(), z.clone()]).unwrap();
        let backward = Tree::new(vec![z, a]).unwrap();
        assert_eq!(
            hash(&encode(&Object::Tree(forward))),
            hash(&encode(&Object::Tree(backward)))
        );
    }

    #[test]
    fn decoded_tree_reencodes_to_stored_bytes() {
        let mut body = b"100644 z\0".to_vec();
        body.extend_from_slice(&[1; 20]);
        body.extend_from_slice(b"100644 a\0");
        body.extend_from_slice(&[2; 20]);
        let mut bytes = format!("tree {}\0", body.len()).into_bytes();
        bytes.extend_from_slice(&body);
        assert_eq!(encode(&decode(&bytes).unwrap()), bytes);
    }

    #[test]
    fn commit_encoding_layout() {
        let parent = ObjectHash::from_raw([0x11; 20]);
        let encoded = encode(&Object::Commit(sample_commit(Some(parent))));
        let (header, body) = decode_header(&encoded).unwrap();
        assert_eq!(header.kind, ObjectKind::Commit);
        let expected = format!(
            "tree {EMPTY_TREE}\n\
             parent {parent}\n\
             author Ada Lovelace <ada@example.com> 1700000000 +0100\n\
             committer Ada Lovelace <ada@example.com> 1700000000 +0100\n\
             \n\
             initial commit\n"
        );
        assert_eq!(body, expected.as_bytes());
    }

    #[test]
    fn commit_hash_matches_known_value() {
        let encoded = encode(&Object::Commit(sample_commit(None)));
        assert_eq!(
            hash(&encoded).to_hex(),
            "f04d8b4af81806700138db11e1024beef5b28575"
        );
    }

    // -----------------------------------------------------------------------
    // Round trips
    // -----------------------------------------------------------------------

    #[test]
    fn tree_roundtrip() {
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::RegularFile, "file.txt", ObjectHash::digest(b"a")),
            TreeEntry::new(EntryMode::Directory, "subdir", ObjectHash::digest(b"b")),
        ])
        .unwrap();
        let object = Object::Tree(tree);
        assert_eq!(decode(&encode(&object)).unwrap(), object);
    }

    #[test]
    fn empty_tree_roundtrip() {
        let object = Object::Tree(Tree::empty());
        assert_eq!(decode(&encode(&object)).unwrap(), object);
    }

    #[test]
    fn commit_roundtrip_with_and_without_parent() {
        for parent in [None, Some(ObjectHash::digest(b"parent"))] {
            let object = Object::Commit(sample_commit(parent));
            assert_eq!(decode(&encode(&object)).unwrap(), object);
        }
    }

    #[test]
    fn commit_without_parent_omits_line() {
        let encoded = encode(&Object::Commit(sample_commit(None)));
        let text = String::from_utf8(encoded).unwrap();
        assert!(!text.contains("parent "));
    }

    #[test]
    fn commit_message_is_verbatim() {
        let mut commit = sample_commit(None);
        commit.message = "no trailing newline\n\n  with blank lines".into();
        let object = Object::Commit(commit);
        assert_eq!(decode(&encode(&object)).unwrap(), object);
    }

    #[test]
    fn commit_legacy_committer_label_is_accepted() {
        let body = format!(
            "tree {EMPTY_TREE}\n\
             author eka <eka@example.com> 946684800 +0000\n\
             commiter eka <eka@example.com> 946684800 +0000\n\
             \n\
             msg"
        );
        let mut bytes = format!("commit {}\0", body.len()).into_bytes();
        bytes.extend_from_slice(body.as_bytes());
        let commit = decode(&bytes).unwrap().into_commit(hash(&bytes)).unwrap();
        assert_eq!(commit.committer.name(), "eka");
        assert_eq!(commit.message, "msg");
    }

    // -----------------------------------------------------------------------
    // Malformed input
    // -----------------------------------------------------------------------

    #[test]
    fn header_without_nul_is_malformed() {
        assert_malformed(b"blob 5 hello");
    }

    #[test]
    fn unknown_kind_is_malformed() {
        assert_malformed(b"tag 0\0");
    }

    #[test]
    fn length_mismatch_is_malformed() {
        assert_malformed(b"blob 4\0hello");
        assert_malformed(b"blob 6\0hello");
        assert_malformed(b"blob \0");
        assert_malformed(b"blob +5\0hello");
    }

    #[test]
    fn non_canonical_length_is_malformed() {
        assert_malformed(b"blob 05\0hello");
        assert_malformed(b"blob 00\0");
        assert!(decode(b"blob 0\0").is_ok());
    }

    #[test]
    fn tree_with_duplicate_names_is_malformed() {
        let mut body = Vec::new();
        for mode in ["100644", "40000"] {
            body.extend_from_slice(format!("{mode} a\0").as_bytes());
            body.extend_from_slice(&[0x42; 20]);
        }
        let mut bytes = format!("tree {}\0", body.len()).into_bytes();
        bytes.extend_from_slice(&body);
        assert_malformed(&bytes);
    }

    #[test]
    fn tree_with_short_trailing_hash_is_malformed() {
        let mut body = b"100644 a.txt\0".to_vec();
        body.extend_from_slice(&[0x42; 19]);
        let mut bytes = format!("tree {}\0", body.len()).into_bytes();
        bytes.extend_from_slice(&body);
        assert_malformed(&bytes);
    }

    #[test]
    fn tree_entry_without_space_is_malformed() {
        let mut body = b"100644a.txt\0".to_vec();
        body.extend_from_slice(&[0x42; 20]);
        let mut bytes = format!("tree {}\0", body.len()).into_bytes();
        bytes.extend_from_slice(&body);
        assert_malformed(&bytes);
    }

    #[test]
    fn tree_entry_without_nul_is_malformed() {
        let body = b"100644 a.txt";
        let mut bytes = format!("tree {}\0", body.len()).into_bytes();
        bytes.extend_from_slice(body);
        assert_malformed(&bytes);
    }

    #[test]
    fn commit_without_tree_is_malformed() {
        let body = "author a <a@b> 0 +0000\ncommitter a <a@b> 0 +0000\n\nmsg";
        let mut bytes = format!("commit {}\0", body.len()).into_bytes();
        bytes.extend_from_slice(body.as_bytes());
        assert_malformed(&bytes);
    }

    #[test]
    fn commit_with_two_parents_is_malformed() {
        let p = ObjectHash::digest(b"p");
        let body = format!(
            "tree {EMPTY_TREE}\nparent {p}\nparent {p}\nauthor a <a@b> 0 +0000\ncommitter a <a@b> 0 +0000\n\nmsg"
        );
        let mut bytes = format!("commit {}\0", body.len()).into_bytes();
        bytes.extend_from_slice(body.as_bytes());
        assert_malformed(&bytes);
    }

    proptest! {
        #[test]
        fn blob_roundtrip_any_bytes(content in proptest::collection::vec(any::<u8>(), 0..512)) {
            let object = Object::Blob(Blob::new(content));
            let encoded = encode(&object);
            prop_assert_eq!(hash(&encoded), hash(&encode(&object)));
            prop_assert_eq!(decode(&encoded).unwrap(), object);
        }

        #[test]
        fn tree_roundtrip_any_names(names in proptest::collection::btree_set("[a-zA-Z0-9._-]{1,12}", 0..8)) {
            let entries = names
                .iter()
                .filter(|n| n.as_str() != "." && n.as_str() != "..")
                .map(|n| TreeEntry::new(EntryMode::RegularFile, n.clone(), ObjectHash::digest(n.as_bytes())))
                .collect();
            let object = Object::Tree(Tree::new(entries).unwrap());
            prop_assert_eq!(decode(&encode(&object)).unwrap(), object);
        }
    }
}
