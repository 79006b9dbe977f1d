//! Cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a URL: the hex SHA-256 of the URL string.
pub fn compute_cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("gemini://example.org/");
        let hash2 = compute_cache_key("gemini://example.org/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_url() {
        assert_ne!(compute_cache_key("gemini://example.org/a"), compute_cache_key("gemini://example.org/b"));
    }

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            compute_cache_key(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("gopher://example.org:70/1/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
