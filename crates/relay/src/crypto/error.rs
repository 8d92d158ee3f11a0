//! Errors produced by the token codec.

use thiserror::Error;

/// Failure modes of key derivation and token encode/decode.
///
/// The HTTP attachment route collapses every variant into the same
/// "not found" response; the distinction only exists for logs and tests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The configured secret is absent or empty.
    #[error("token secret is missing or empty")]
    Configuration,

    /// The cipher rejected the key, or the filename cannot be encoded.
    #[error("token encoding failed: {0}")]
    Encoding(&'static str),

    /// The token is not structurally valid (alphabet, base64, length, UTF-8).
    #[error("malformed token")]
    MalformedToken,

    /// The authentication tag did not verify: altered data, wrong key, or
    /// a token this service never issued.
    #[error("token tampered with or not issued by this service")]
    TamperedOrInvalid,
}
