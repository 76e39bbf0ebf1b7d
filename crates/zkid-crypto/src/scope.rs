//! Service scope hashing. A disclosure proof binds its nullifier to the
//! relying party's domain and an optional application scope.

use crate::packing::MAX_FIELD_BYTES;
use sha2::{Digest, Sha256};
use zkid_types::Bytes32;

/// Truncated SHA-256 digest of the UTF-8 string, as a field element.
pub fn scope_hash(value: &str) -> Bytes32 {
    sha256_field(value.as_bytes())
}

/// First 31 bytes of the SHA-256 digest.
pub fn sha256_field(bytes: &[u8]) -> Bytes32 {
    let digest = Sha256::digest(bytes);
    let mut word = [0u8; 32];
    word[1..].copy_from_slice(&digest[..MAX_FIELD_BYTES]);
    Bytes32(word)
}

/// Reduces a URL or host to the bare host name the proof was scoped to.
pub fn normalize_domain(domain: &str) -> String {
    let mut host = domain.trim().to_lowercase();
    if let Some(pos) = host.find("://") {
        host = host[pos + 3..].to_string();
    }
    if let Some(pos) = host.find(['/', '?', '#']) {
        host.truncate(pos);
    }
    if let Some(pos) = host.rfind(':') {
        if host[pos + 1..].chars().all(|c| c.is_ascii_digit()) {
            host.truncate(pos);
        }
    }
    while host.ends_with('.') {
        host.pop();
    }
    host
}

pub fn service_scope_hash(domain: &str) -> Bytes32 {
    scope_hash(&normalize_domain(domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("https://Example.com:8443/path?q=1#x"), "example.com");
        assert_eq!(normalize_domain("  demo.zkid.dev. "), "demo.zkid.dev");
        assert_eq!(normalize_domain("localhost:3000"), "localhost");
        assert_eq!(normalize_domain("app.example.org/login"), "app.example.org");
    }

    #[test]
    fn test_scope_hash_is_31_bytes() {
        let hash = scope_hash("example.com");
        assert_eq!(hash.as_bytes()[0], 0);
        let digest = Sha256::digest(b"example.com");
        assert_eq!(&hash.as_bytes()[1..], &digest[..31]);
    }

    #[test]
    fn test_service_scope_ignores_url_decoration() {
        assert_eq!(
            service_scope_hash("https://example.com/verify"),
            service_scope_hash("example.com")
        );
        assert_ne!(service_scope_hash("example.com"), service_scope_hash("example.org"));
    }
}
