//! Content-addressed keys for conflict resolutions.
//!
//! A key is built from four digests: the two side digests in sorted order,
//! then the base digest, then the path digest. Sorting the side digests makes
//! the key the same whichever branch was merged into which.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::StoreError;

use super::markers::Hunk;

/// Bytes kept from each SHA-256 digest.
const COMPONENT_BYTES: usize = 16;

/// Length of a key in hex characters.
pub const KEY_LEN: usize = COMPONENT_BYTES * 2 * 4;

/// Identifier of one hunk's resolution: 128 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResolutionKey(String);

impl ResolutionKey {
    /// Compute the key for `hunk` found in the file at `path`.
    pub fn for_hunk(hunk: &Hunk, path: &str) -> Self {
        let mut sides = [digest(&hunk.ours), digest(&hunk.theirs)];
        sides.sort();
        let [first, second] = sides;
        Self([first, second, digest(&hunk.base), digest(path.as_bytes())].concat())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResolutionKey {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let well_formed = value.len() == KEY_LEN
            && value.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed {
            Ok(Self(value))
        } else {
            Err(StoreError::InvalidKey(value))
        }
    }
}

impl std::str::FromStr for ResolutionKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<ResolutionKey> for String {
    fn from(key: ResolutionKey) -> Self {
        key.0
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(&Sha256::digest(bytes)[..COMPONENT_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunk(ours: &[u8], base: &[u8], theirs: &[u8]) -> Hunk {
        Hunk {
            start: 0,
            end: 0,
            ours: ours.to_vec(),
            base: base.to_vec(),
            theirs: theirs.to_vec(),
        }
    }

    #[test]
    fn test_key_is_order_independent() {
        let forward = ResolutionKey::for_hunk(&hunk(b"A\n", b"C\n", b"B\n"), "src/lib.rs");
        let reverse = ResolutionKey::for_hunk(&hunk(b"B\n", b"C\n", b"A\n"), "src/lib.rs");
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_key_ignores_hunk_position() {
        let mut moved = hunk(b"A\n", b"C\n", b"B\n");
        moved.start = 100;
        moved.end = 140;
        assert_eq!(
            ResolutionKey::for_hunk(&moved, "f"),
            ResolutionKey::for_hunk(&hunk(b"A\n", b"C\n", b"B\n"), "f")
        );
    }

    #[test]
    fn test_key_is_sensitive_to_every_input() {
        let key = ResolutionKey::for_hunk(&hunk(b"A\n", b"C\n", b"B\n"), "src/lib.rs");
        let variants = [
            ResolutionKey::for_hunk(&hunk(b"A\n", b"C\n", b"B\n"), "src/main.rs"),
            ResolutionKey::for_hunk(&hunk(b"A2\n", b"C\n", b"B\n"), "src/lib.rs"),
            ResolutionKey::for_hunk(&hunk(b"A\n", b"C\n", b"B2\n"), "src/lib.rs"),
            ResolutionKey::for_hunk(&hunk(b"A\n", b"", b"B\n"), "src/lib.rs"),
        ];
        for variant in &variants {
            assert_ne!(&key, variant);
        }
    }

    #[test]
    fn test_key_shape() {
        let key = ResolutionKey::for_hunk(&hunk(b"x", b"", b"y"), "p");
        assert_eq!(key.as_str().len(), KEY_LEN);
        assert_eq!(key.to_string().parse::<ResolutionKey>().unwrap(), key);
        assert!("not-a-key".parse::<ResolutionKey>().is_err());
        assert!("A".repeat(KEY_LEN).parse::<ResolutionKey>().is_err());
    }
}
