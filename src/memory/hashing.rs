//! Content identity — deterministic fingerprints for memory records.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Compute the content hash for a memory: SHA-256 over the content followed
/// by a canonical serialization of the metadata (keys sorted, values in their
/// JSON form). Pure and deterministic — the same `(content, metadata)` pair
/// always yields the same hash, and changing any metadata value changes it.
pub fn generate_content_hash(content: &str, metadata: &Map<String, Value>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());

    let mut keys: Vec<&String> = metadata.keys().collect();
    keys.sort();
    for key in keys {
        // Unit separator keeps ("ab", c=1) distinct from ("a", bc=1).
        hasher.update([0x1f]);
        hasher.update(key.as_bytes());
        hasher.update([0x1e]);
        hasher.update(metadata[key].to_string().as_bytes());
    }

    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        // Writing to a String cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
    out
}
