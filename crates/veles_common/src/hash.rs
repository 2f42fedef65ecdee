//! Content and entry hashing built on XXH3.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit content hash computed using XXH3.
///
/// Used to fingerprint save-point snapshots and the persisted NPN4 database
/// so stale caches are detected and regenerated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Hashes a subnet entry index into a 64-bit word.
///
/// Cut signatures are the OR of their leaves' entry hashes; a good spread
/// over the 64 bits keeps the signature-based subset pre-check selective.
pub fn entry_hash(index: usize) -> u64 {
    xxhash_rust::xxh3::xxh3_64(&(index as u64).to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"subnet snapshot");
        let b = ContentHash::from_bytes(b"subnet snapshot");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContentHash::from_bytes(b"point_a");
        let b = ContentHash::from_bytes(b"point_b");
        assert_ne!(a, b);
    }

    #[test]
    fn display_format() {
        let h = ContentHash::from_bytes(b"test");
        let s = format!("{h}");
        assert_eq!(s.len(), 32, "Display should be 32 hex chars");
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn entry_hash_deterministic() {
        assert_eq!(entry_hash(42), entry_hash(42));
        assert_ne!(entry_hash(42), entry_hash(43));
    }

    #[test]
    fn entry_hash_spreads_bits() {
        // Adjacent indices should not collapse onto the same few bits.
        let merged = entry_hash(0) | entry_hash(1) | entry_hash(2) | entry_hash(3);
        assert!(merged.count_ones() > 16);
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::from_bytes(b"serde test");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
