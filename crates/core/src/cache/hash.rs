//! Request fingerprinting.

use crate::envelope::RequestDescriptor;
use sha2::{Digest, Sha256};

/// Compute the cache key for a request.
///
/// Hashes URL, method and body only. Headers are left out so that volatile
/// metadata such as `user-agent` does not split entries for the same request.
pub fn fingerprint(req: &RequestDescriptor) -> String {
    let mut hasher = Sha256::new();
    hasher.update(req.url().as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(req.method().as_bytes());
    hasher.update(b"\n");
    hasher.update(req.body().as_bytes());
    hex::encode(hasher.finalize())
}
