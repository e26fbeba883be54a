//! PII masking.
//!
//! Replaces a sensitive value with the lowercase hex SHA-256 digest of its
//! UTF-8 bytes. No salt is applied: the same input always yields the same
//! token, so masked values stay joinable across records and runs. The price
//! is that small input spaces (IPv4 addresses) can be enumerated offline.

use sha2::{Digest, Sha256};

/// Length of a masked token in hex characters.
pub const MASKED_LEN: usize = 64;

/// Mask a value into a 64-character lowercase hex token.
pub fn mask(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check whether a string has the shape of a masked token.
pub fn is_masked_token(s: &str) -> bool {
    s.len() == MASKED_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
