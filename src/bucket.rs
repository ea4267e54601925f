//! Hash Bucketer
//!
//! Maps `(subject, experiment, purpose)` to a stable pseudo-random integer.
//! The hash is BLAKE3 over the UTF-8 key, truncated to its first eight bytes
//! (little-endian). There is no per-process seed: the same key buckets the
//! same way in every process and after every restart.

use std::fmt::Display;

/// Bucketing purpose for the traffic-inclusion gate.
pub const TRAFFIC_PURPOSE: &str = "traffic";

/// Bucketing purpose for weighted variant selection.
pub const VARIANT_PURPOSE: &str = "variant";

/// Build the canonical bucketing key `"{subject}:{experiment}:{purpose}"`.
#[must_use]
pub fn bucket_key(subject: impl Display, experiment: &str, purpose: &str) -> String {
    format!("{subject}:{experiment}:{purpose}")
}

/// Deterministic 64-bit hash of a bucketing key.
#[must_use]
pub fn hash_key(key: &str) -> u64 {
    let digest = blake3::hash(key.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// Bucket a key into `[0, modulus)`.
///
/// Returns `None` for a zero modulus.
#[must_use]
pub fn bucket(key: &str, modulus: u64) -> Option<u64> {
    if modulus == 0 {
        return None;
    }
    Some(hash_key(key) % modulus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_key_format() {
        assert_eq!(
            bucket_key(42, "onboarding_flow", TRAFFIC_PURPOSE),
            "42:onboarding_flow:traffic"
        );
        assert_eq!(
            bucket_key("user-7", "checkout", VARIANT_PURPOSE),
            "user-7:checkout:variant"
        );
    }

    #[test]
    fn test_hash_key_deterministic() {
        let a = hash_key("1:onboarding_flow:variant");
        let b = hash_key("1:onboarding_flow:variant");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_key_matches_blake3_prefix() {
        let digest = blake3::hash(b"abc");
        let expected = u64::from_le_bytes(digest.as_bytes()[..8].try_into().unwrap());
        assert_eq!(hash_key("abc"), expected);
    }

    #[test]
    fn test_purposes_hash_independently() {
        let traffic = hash_key(&bucket_key(1, "exp", TRAFFIC_PURPOSE));
        let variant = hash_key(&bucket_key(1, "exp", VARIANT_PURPOSE));
        assert_ne!(traffic, variant);
    }

    #[test]
    fn test_bucket_range() {
        for i in 0..1000 {
            let key = bucket_key(i, "exp", TRAFFIC_PURPOSE);
            let value = bucket(&key, 100).unwrap();
            assert!(value < 100);
        }
    }

    #[test]
    fn test_bucket_zero_modulus() {
        assert_eq!(bucket("anything", 0), None);
    }
}
