//! Key encoding utilities for `RocksDB`.

use gatekeeper_core::UserId;

/// Encode a user key (the 16 UUID bytes).
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Encode a login index key.
#[must_use]
pub fn login_key(login: &str) -> Vec<u8> {
    login.as_bytes().to_vec()
}
