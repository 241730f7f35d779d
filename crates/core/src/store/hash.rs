//! Request path normalization and cache key generation.

use sha2::{Digest, Sha256};

/// Normalize a request path so equivalent requests map to one cache slot.
///
/// Ensures a leading slash, drops any fragment, and keeps the query string
/// since it can select a different resource.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let without_fragment = match trimmed.split_once('#') {
        Some((before, _)) => before,
        None => trimmed,
    };
    if without_fragment.starts_with('/') {
        without_fragment.to_string()
    } else {
        format!("/{without_fragment}")
    }
}

/// Compute the cache key for a request path.
pub fn request_key(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_path(path).as_bytes());
    hex::encode(hasher.finalize())
}
