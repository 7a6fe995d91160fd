use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Length in bytes of a binary object digest.
pub const DIGEST_LEN: usize = 64;

/// Opaque identifier for one stored blob.
///
/// The textual form is `"<generation>~<digest>"`, where the digest is the
/// URL-safe, unpadded base64 encoding of a 64-byte binary id. Identifiers
/// are assigned by the producing tool; this crate never mints new ones
/// except from digests read out of an existing ref-list.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate a textual object id.
    ///
    /// The id ends up as part of a file name, so path separators and `..`
    /// are rejected along with structurally malformed ids.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidObjectId {
            id: s.to_string(),
            reason: reason.to_string(),
        };

        let (generation, digest) = s.split_once('~').ok_or_else(|| invalid("missing '~'"))?;
        if generation.is_empty() {
            return Err(invalid("empty generation"));
        }
        if digest.is_empty() {
            return Err(invalid("empty digest"));
        }
        if s.contains('/') || s.contains('\\') || s.contains("..") {
            return Err(invalid("contains a path component"));
        }
        Ok(Self(s.to_string()))
    }

    /// Build an id from a generation tag and a binary digest.
    pub fn from_digest(generation: &str, digest: &[u8; DIGEST_LEN]) -> Self {
        Self(format!("{generation}~{}", URL_SAFE_NO_PAD.encode(digest)))
    }

    /// The generation tag (text before `~`).
    pub fn generation(&self) -> &str {
        self.0.split_once('~').map(|(g, _)| g).unwrap_or_default()
    }

    /// The encoded digest (text after `~`).
    pub fn digest(&self) -> &str {
        self.0.split_once('~').map(|(_, d)| d).unwrap_or_default()
    }

    /// Decode the digest back to its binary form.
    pub fn digest_bytes(&self) -> Result<[u8; DIGEST_LEN], TypeError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(self.digest())
            .map_err(|e| TypeError::InvalidDigest(e.to_string()))?;
        if bytes.len() != DIGEST_LEN {
            return Err(TypeError::InvalidLength {
                expected: DIGEST_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; DIGEST_LEN];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }

    /// The textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the blob holding this object's bytes.
    pub fn blob_file_name(&self) -> String {
        format!("data.{}", self.0)
    }

    /// File name of the ref-list side-file for a directory-shaped object.
    pub fn refs_file_name(&self) -> String {
        format!("refs.{}", self.0)
    }

    /// Short representation for logs (generation plus first 8 digest chars).
    pub fn short(&self) -> String {
        let prefix: String = self.digest().chars().take(8).collect();
        format!("{}~{prefix}", self.generation())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
