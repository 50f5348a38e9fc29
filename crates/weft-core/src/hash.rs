//! Content hashing using SHA-256.
//!
//! Every object in the store, every staged spec, and every commit is
//! identified by a lowercase hex SHA-256 digest.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of arbitrary bytes, returned as a hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex_encode(&hasher.finalize())
}

/// Compute the SHA-256 hash of a string.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}

/// Encode raw bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash_str("spec body"), hash_str("spec body"));
    }

    #[test]
    fn test_hash_different_inputs() {
        assert_ne!(hash_str("a"), hash_str("b"));
    }

    #[test]
    fn test_hash_is_64_hex_chars() {
        let h = hash_bytes(b"generated output");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
