//! Built-in transformer functions.

use md5::Md5;
use sha2::{Digest, Sha256};

/// Mail domain appended by [`hash_email`].
pub const HASH_EMAIL_DOMAIN: &str = "@example.com";

/// Replacement text used by the `redact` transformer.
pub const REDACTED: &str = "[REDACTED]";

/// Lower-hex MD5 digest of the value.
pub fn md5_hex(data: &str) -> String {
    format!("{:x}", Md5::digest(data.as_bytes()))
}

/// Lower-hex SHA-256 digest of the value.
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Deterministic fake address: 16 hex chars of the MD5 digest plus a fixed domain.
///
/// Equal inputs map to equal addresses, so uniqueness constraints on the
/// column survive obfuscation (up to 64-bit collisions).
pub fn hash_email(data: &str) -> String {
    let mut out = md5_hex(data);
    out.truncate(16);
    out.push_str(HASH_EMAIL_DOMAIN);
    out
}
