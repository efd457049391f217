// crates/bmad-core/src/core/hashing.rs
// ============================================================================
// Module: BMAD Canonical Hashing
// Description: Deterministic content hashing for documents and audit records.
// Purpose: Give template sections and state snapshots a stable fingerprint.
// Dependencies: serde_json, serde_jcs, sha2, thiserror
// ============================================================================

//! ## Overview
//! Document sections, workflow state snapshots, and ADR bodies are hashed
//! after canonicalizing their JSON representation per RFC 8785. Two values
//! that differ only by key order or insignificant whitespace hash identically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while canonicalizing or hashing content.
#[derive(Debug, Error)]
pub enum HashError {
    /// The value could not be canonicalized (non-finite float, cyclic structure).
    #[error("failed to canonicalize value: {0}")]
    Canonicalization(String),
    /// The canonical byte representation exceeded the configured size limit.
    #[error("canonical content size {actual} exceeds limit {limit}")]
    SizeLimitExceeded {
        /// Configured limit in bytes.
        limit: usize,
        /// Actual canonical byte length.
        actual: usize,
    },
}

// ============================================================================
// SECTION: Hash Types
// ============================================================================

/// Hash algorithm used for a [`HashDigest`].
///
/// # Invariants
/// - Only one variant exists today; the tag is kept explicit so new
///   algorithms can be added without breaking serialized digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 over canonical JSON bytes.
    Sha256,
}

/// Default hash algorithm used when a caller has no preference.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// A content digest paired with the algorithm used to produce it.
///
/// # Invariants
/// - `value` is lowercase hex and its length matches the algorithm's digest size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct HashDigest {
    /// Algorithm used to produce `value`.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest.
    pub value: String,
}

// ============================================================================
// SECTION: Canonicalization
// ============================================================================

/// Serializes a value to canonical JSON bytes per RFC 8785 (JCS).
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when the value cannot be
/// serialized (e.g. it contains a non-finite float).
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes a value's canonical JSON representation with [`DEFAULT_HASH_ALGORITHM`].
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when canonicalization fails.
pub fn hash_canonical_json<T: Serialize>(value: &T) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(&bytes))
}

/// Hashes a value's canonical JSON representation, rejecting content whose
/// canonical byte length exceeds `limit`.
///
/// Used by the template processor to bound the cost of hashing generated
/// document sections before writing them to disk.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when canonicalization fails, or
/// [`HashError::SizeLimitExceeded`] when the canonical bytes exceed `limit`.
pub fn hash_canonical_json_with_limit<T: Serialize>(
    value: &T,
    limit: usize,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    if bytes.len() > limit {
        return Err(HashError::SizeLimitExceeded {
            limit,
            actual: bytes.len(),
        });
    }
    Ok(hash_bytes(&bytes))
}

/// Hashes raw bytes with [`DEFAULT_HASH_ALGORITHM`].
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> HashDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    HashDigest {
        algorithm: HashAlgorithm::Sha256,
        value: hex_encode(&digest),
    }
}

/// Encodes bytes as lowercase hex.
fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // `write!` into a `String` never fails.
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::hash_bytes;
    use super::hash_canonical_json;
    use super::hash_canonical_json_with_limit;
    use serde_json::json;

    #[test]
    fn empty_object_has_stable_digest() {
        let digest = hash_canonical_json(&json!({})).expect("hash succeeds");
        assert_eq!(
            digest.value,
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8"
        );
    }

    #[test]
    fn key_order_does_not_affect_digest() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(
            hash_canonical_json(&a).expect("hash a"),
            hash_canonical_json(&b).expect("hash b")
        );
    }

    #[test]
    fn size_limit_rejects_oversized_content() {
        let value = json!({"data": "x".repeat(100)});
        let result = hash_canonical_json_with_limit(&value, 16);
        assert!(result.is_err());
    }

    #[test]
    fn hash_bytes_is_lowercase_hex() {
        let digest = hash_bytes(b"bmad");
        assert!(digest.value.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest.value.len(), 64);
    }
}
