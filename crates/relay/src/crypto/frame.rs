//! URL-safe base64 framing for tokens.
//!
//! Tokens travel without padding. On the way back in, padding is restored
//! before decoding so the decoder only ever sees canonical input.

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig},
        DecodePaddingMode,
    },
    DecodeError, Engine as _,
};

use super::error::TokenError;

// Unused low bits in the last character must be zero, so each frame has
// exactly one token spelling.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Length of the unpadded base64 encoding of `n` bytes.
pub const fn encoded_len(n: usize) -> usize {
    (n * 4 + 2) / 3
}

/// Encode raw frame bytes as unpadded URL-safe base64.
pub fn encode(bytes: &[u8]) -> String {
    TOKEN_ENGINE.encode(bytes)
}

/// Decode an unpadded URL-safe base64 token back into frame bytes.
///
/// # Errors
///
/// - [`TokenError::TamperedOrInvalid`] if the last character sets bits the
///   encoder never sets, i.e. the token was altered after issue.
/// - [`TokenError::MalformedToken`] if `token` contains anything outside
///   `[A-Za-z0-9_-]` or is otherwise not decodable once padding is restored.
pub fn decode(token: &str) -> Result<Vec<u8>, TokenError> {
    if !token.bytes().all(is_url_safe) {
        return Err(TokenError::MalformedToken);
    }
    let pad = (4 - token.len() % 4) % 4;
    let mut padded = String::with_capacity(token.len() + pad);
    padded.push_str(token);
    padded.extend(std::iter::repeat('=').take(pad));
    TOKEN_ENGINE.decode(padded).map_err(|e| match e {
        DecodeError::InvalidLastSymbol(..) => TokenError::TamperedOrInvalid,
        _ => TokenError::MalformedToken,
    })
}

fn is_url_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
