//! Key material derivation: normalises an operator secret into an AES key.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::TokenError;

/// Key sizes accepted by the cipher (AES-128, AES-192, AES-256).
pub const VALID_KEY_LENS: [usize; 3] = [16, 24, 32];

/// Derived symmetric key.
///
/// Holds exactly 16, 24 or 32 bytes, zeroized on drop. The cipher built from
/// it keeps its own expanded key schedule, which the `aes` crate zeroizes
/// when the cipher is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct TokenKey(Box<[u8]>);

impl TokenKey {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenKey({} bytes, [REDACTED])", self.0.len())
    }
}

/// Derive the codec key from the configured secret.
///
/// A secret that is already 16, 24 or 32 bytes long is used as-is. Any other
/// length is hashed with SHA-256, giving a 32-byte key. Pure: the same secret
/// always yields the same key.
///
/// # Errors
///
/// Returns [`TokenError::Configuration`] if `secret` is empty.
pub fn derive_key(secret: &[u8]) -> Result<TokenKey, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::Configuration);
    }
    let bytes: Box<[u8]> = if VALID_KEY_LENS.contains(&secret.len()) {
        secret.into()
    } else {
        Sha256::digest(secret).as_slice().into()
    };
    Ok(TokenKey(bytes))
}
