//! Hashing utilities for admin key verification.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks a presented key against a stored SHA-256 hex digest.
///
/// The comparison runs over every byte regardless of where the first
/// mismatch occurs.
pub fn verify_key_hash(presented: &str, expected_hex: &str) -> bool {
    let actual = sha256_hex(presented);
    let expected = expected_hex.trim().to_ascii_lowercase();

    if actual.len() != expected.len() {
        return false;
    }

    actual
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
