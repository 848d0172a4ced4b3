//! Keyed-hash and comparison helpers shared by the verifier and the admin authority.

use crate::error::{ShopError, ShopResult};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Build an HMAC-SHA256 instance keyed with `key`.
pub(crate) fn hmac_sha256(key: &[u8]) -> ShopResult<HmacSha256> {
    HmacSha256::new_from_slice(key).map_err(|e| ShopError::Internal(format!("HMAC key: {}", e)))
}

/// HMAC-SHA256 of `message`, lower-case hex encoded (64 chars).
pub fn hmac_sha256_hex(key: &[u8], message: &str) -> ShopResult<String> {
    let mut mac = hmac_sha256(key)?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compare two byte strings without early exit on the first differing byte.
///
/// Length is not secret here: callers compare fixed-size digests.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Constant-time equality of two strings of arbitrary length.
///
/// Both sides are hashed first so neither content nor length leaks through timing.
pub fn digest_eq(a: &str, b: &str) -> bool {
    let left = Sha256::digest(a.as_bytes());
    let right = Sha256::digest(b.as_bytes());
    constant_time_eq(&left, &right)
}
