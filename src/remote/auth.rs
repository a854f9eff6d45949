//! Shared-secret digest carried in the `X-API-Key-Hash` header.
//!
//! Both directions use the same credential: outbound requests send the
//! SHA-256 digest of the API key, and inbound callbacks must present it.

use hmac::digest::{CtOutput, Output};
use sha2::{Digest, Sha256};

/// Header carrying the hex digest of the API key.
pub const API_KEY_HASH_HEADER: &str = "x-api-key-hash";

/// Lowercase hex SHA-256 digest of the API key.
pub fn api_key_hash(api_key: &str) -> String {
    hex::encode(Sha256::digest(api_key.as_bytes()))
}

/// Check a digest presented by a caller against the configured key.
///
/// The comparison runs in constant time over the decoded bytes. Anything that
/// is not a 64-character hex string is rejected outright.
pub fn verify_api_key_hash(api_key: &str, provided: &str) -> bool {
    let provided = match hex::decode(provided.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    if provided.len() != Sha256::output_size() {
        return false;
    }

    let expected = CtOutput::<Sha256>::new(Sha256::digest(api_key.as_bytes()));
    let provided = CtOutput::<Sha256>::new(Output::<Sha256>::clone_from_slice(&provided));

    expected == provided
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // sha256("secret")
        assert_eq!(
            api_key_hash("secret"),
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
        );
    }

    #[test]
    fn test_verify_accepts_matching_digest() {
        let digest = api_key_hash("k3y");
        assert!(verify_api_key_hash("k3y", &digest));
        assert!(verify_api_key_hash("k3y", &digest.to_uppercase()));
    }

    #[test]
    fn test_verify_rejects_mismatch() {
        assert!(!verify_api_key_hash("k3y", &api_key_hash("other")));
        // raw key instead of digest
        assert!(!verify_api_key_hash("k3y", "k3y"));
        assert!(!verify_api_key_hash("k3y", ""));
        // truncated digest
        assert!(!verify_api_key_hash("k3y", &api_key_hash("k3y")[..32]));
    }
}
