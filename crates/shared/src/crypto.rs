//! Hashing helpers.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derives the stored key for an anonymous attempt counter.
///
/// The key is `HMAC-SHA256(secret, "{survey_id}|{fingerprint}|{client_ip}")`
/// in lowercase hex, so raw fingerprints and addresses never reach the
/// database and counters are scoped to one survey.
pub fn attempt_fingerprint_hash(
    secret: &str,
    survey_id: i64,
    fingerprint: &str,
    client_ip: &str,
) -> String {
    let payload = format!("{}|{}|{}", survey_id, fingerprint.trim(), client_ip.trim());
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(payload.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
        // HMAC accepts keys of any length
        Err(_) => sha256_hex(&format!("{}|{}", secret, payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_attempt_hash_is_hex_sha256_sized() {
        let hash = attempt_fingerprint_hash("secret", 1, "fp-abc", "10.0.0.1");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_attempt_hash_is_deterministic() {
        let a = attempt_fingerprint_hash("secret", 3, "fp", "10.0.0.1");
        let b = attempt_fingerprint_hash("secret", 3, " fp ", "10.0.0.1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_attempt_hash_depends_on_every_input() {
        let base = attempt_fingerprint_hash("secret", 3, "fp", "10.0.0.1");
        assert_ne!(base, attempt_fingerprint_hash("other", 3, "fp", "10.0.0.1"));
        assert_ne!(base, attempt_fingerprint_hash("secret", 4, "fp", "10.0.0.1"));
        assert_ne!(base, attempt_fingerprint_hash("secret", 3, "fp2", "10.0.0.1"));
        assert_ne!(base, attempt_fingerprint_hash("secret", 3, "fp", "10.0.0.2"));
    }
}
