use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};

use crate::error::TypeError;

/// Length of a raw object hash in bytes.
pub const HASH_LEN: usize = 20;

/// Length of a hex-encoded object hash.
pub const HEX_LEN: usize = HASH_LEN * 2;

/// Content-addressed identifier for any stored object.
///
/// An `ObjectHash` is the SHA-1 digest of an object's full encoded bytes
/// (header included). Identical encodings always produce the same hash, so
/// the hash *is* the object's identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHash([u8; HASH_LEN]);

impl ObjectHash {
    /// Compute the hash of already-encoded object bytes.
    pub fn digest(encoded: &[u8]) -> Self {
        Self(Sha1::digest(encoded).into())
    }

    /// Wrap a pre-computed raw digest.
    pub const fn from_raw(raw: [u8; HASH_LEN]) -> Self {
        Self(raw)
    }

    /// Build from a byte slice that must be exactly [`HASH_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let raw: [u8; HASH_LEN] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            expected: HASH_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(raw))
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Lower-case hex representation (40 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 7 characters).
    pub fn short_hex(&self) -> String {
        let mut s = self.to_hex();
        s.truncate(7);
        s
    }

    /// Parse from a 40-character hex string. Upper-case digits are accepted.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: HEX_LEN,
                actual: s.len(),
            });
        }
        let mut raw = [0u8; HASH_LEN];
        hex::decode_to_slice(s, &mut raw).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(raw))
    }

    /// Split the hex form into the shard directory name and the file name
    /// within it (2 + 38 characters).
    pub fn shard_parts(&self) -> (String, String) {
        let hex = self.to_hex();
        let (dir, file) = hex.split_at(2);
        (dir.to_string(), file.to_string())
    }
}

impl fmt::Debug for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHash({})", self.short_hex())
    }
}

impl fmt::Display for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_LEN]> for ObjectHash {
    fn from(raw: [u8; HASH_LEN]) -> Self {
        Self(raw)
    }
}

impl From<ObjectHash> for [u8; HASH_LEN] {
    fn from(hash: ObjectHash) -> Self {
        hash.0
    }
}

// Hashes travel as hex strings in JSON output, like they are shown everywhere else.
impl Serialize for ObjectHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
