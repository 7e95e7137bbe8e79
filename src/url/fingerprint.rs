use sha2::{Digest, Sha256};

/// Computes the fingerprint of a URL
///
/// The fingerprint is the hex-encoded SHA-256 digest of the URL string. It is
/// used when a request does not carry a fingerprint in its metadata.
pub fn url_fingerprint(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
