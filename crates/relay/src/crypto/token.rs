//! Filename token codec: AES-GCM-SIV over the filename, framed as
//! `nonce ‖ tag ‖ ciphertext` and encoded as unpadded URL-safe base64.
//!
//! **Algorithm choice:** AES-GCM-SIV (RFC 8452) is a counter-mode AEAD, so the
//! ciphertext is exactly as long as the filename and any modification of the
//! frame fails tag verification. A fresh random 96-bit nonce is drawn for every
//! token; the SIV construction additionally limits the damage of an accidental
//! nonce repeat to revealing that two filenames are equal.
//!
//! Key size follows the derived key: 16, 24 or 32 bytes select AES-128,
//! AES-192 or AES-256 respectively.

use aes::Aes192;
use aes_gcm_siv::{
    aead::{rand_core::RngCore, AeadInPlace, KeyInit, OsRng},
    Aes128GcmSiv, Aes256GcmSiv, AesGcmSiv, Nonce, Tag,
};

use super::error::TokenError;
use super::frame;
use super::key::{derive_key, TokenKey};

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the authentication tag.
pub const TAG_LEN: usize = 16;

/// Longest filename a token may carry.
pub const MAX_FILENAME_LEN: usize = 255;

/// Longest token string accepted by [`TokenCodec::decode`].
pub const MAX_TOKEN_LEN: usize = frame::encoded_len(NONCE_LEN + TAG_LEN + MAX_FILENAME_LEN);

/// Associated data bound into every tag. Changing it invalidates all tokens.
const TOKEN_AAD: &[u8] = b"relay/filename-token/v1";

type Aes192GcmSiv = AesGcmSiv<Aes192>;

enum TokenCipher {
    Aes128(Aes128GcmSiv),
    Aes192(Aes192GcmSiv),
    Aes256(Aes256GcmSiv),
}

impl TokenCipher {
    fn new(key: &TokenKey) -> Result<Self, TokenError> {
        let bytes = key.as_bytes();
        let cipher = match bytes.len() {
            16 => Aes128GcmSiv::new_from_slice(bytes).map(Self::Aes128),
            24 => Aes192GcmSiv::new_from_slice(bytes).map(Self::Aes192),
            32 => Aes256GcmSiv::new_from_slice(bytes).map(Self::Aes256),
            _ => return Err(TokenError::Encoding("unsupported key length")),
        };
        cipher.map_err(|_| TokenError::Encoding("cipher rejected key"))
    }

    fn seal(&self, nonce: &Nonce, buffer: &mut [u8]) -> Result<Tag, aes_gcm_siv::Error> {
        match self {
            Self::Aes128(c) => c.encrypt_in_place_detached(nonce, TOKEN_AAD, buffer),
            Self::Aes192(c) => c.encrypt_in_place_detached(nonce, TOKEN_AAD, buffer),
            Self::Aes256(c) => c.encrypt_in_place_detached(nonce, TOKEN_AAD, buffer),
        }
    }

    fn open(&self, nonce: &Nonce, buffer: &mut [u8], tag: &Tag) -> Result<(), aes_gcm_siv::Error> {
        match self {
            Self::Aes128(c) => c.decrypt_in_place_detached(nonce, TOKEN_AAD, buffer, tag),
            Self::Aes192(c) => c.decrypt_in_place_detached(nonce, TOKEN_AAD, buffer, tag),
            Self::Aes256(c) => c.decrypt_in_place_detached(nonce, TOKEN_AAD, buffer, tag),
        }
    }
}

/// Encrypts filenames into opaque URL-safe tokens and back.
///
/// Stateless apart from the cipher built from the key at construction, so a
/// single instance can be shared across any number of tasks.
pub struct TokenCodec {
    cipher: TokenCipher,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits = match self.cipher {
            TokenCipher::Aes128(_) => 128,
            TokenCipher::Aes192(_) => 192,
            TokenCipher::Aes256(_) => 256,
        };
        write!(f, "TokenCodec(AES-{bits}-GCM-SIV)")
    }
}

impl TokenCodec {
    /// Build a codec around an already derived key.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if the cipher rejects the key size.
    pub fn new(key: &TokenKey) -> Result<Self, TokenError> {
        Ok(Self {
            cipher: TokenCipher::new(key)?,
        })
    }

    /// Derive the key from `secret` and build a codec around it.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Configuration`] if `secret` is empty.
    pub fn from_secret(secret: &[u8]) -> Result<Self, TokenError> {
        Self::new(&derive_key(secret)?)
    }

    /// Encrypt `filename` into a token.
    ///
    /// Every call draws a fresh nonce from the OS CSPRNG, so encoding the same
    /// filename twice yields two different tokens.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if `filename` is empty or longer than
    /// [`MAX_FILENAME_LEN`] bytes, or if the AEAD refuses the input.
    pub fn encode(&self, filename: &str) -> Result<String, TokenError> {
        if filename.is_empty() || filename.len() > MAX_FILENAME_LEN {
            return Err(TokenError::Encoding("filename must be 1 to 255 bytes"));
        }

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let mut buf = Vec::with_capacity(NONCE_LEN + TAG_LEN + filename.len());
        buf.extend_from_slice(&nonce);
        buf.extend_from_slice(&[0u8; TAG_LEN]);
        buf.extend_from_slice(filename.as_bytes());

        let (head, body) = buf.split_at_mut(NONCE_LEN + TAG_LEN);
        let tag = self
            .cipher
            .seal(Nonce::from_slice(&nonce), body)
            .map_err(|_| TokenError::Encoding("aead seal failed"))?;
        head[NONCE_LEN..].copy_from_slice(&tag);

        Ok(frame::encode(&buf))
    }

    /// Decrypt and authenticate `token`, returning the original filename.
    ///
    /// Nothing is returned unless the tag verifies.
    ///
    /// # Errors
    ///
    /// - [`TokenError::MalformedToken`] for oversized input, characters outside
    ///   the URL-safe alphabet, undecodable base64, a frame too short to hold a
    ///   nonce and tag, or a plaintext that is empty or not UTF-8.
    /// - [`TokenError::TamperedOrInvalid`] if authentication fails.
    pub fn decode(&self, token: &str) -> Result<String, TokenError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(TokenError::MalformedToken);
        }
        let mut buf = frame::decode(token)?;
        if buf.len() < NONCE_LEN + TAG_LEN {
            return Err(TokenError::MalformedToken);
        }

        let (head, body) = buf.split_at_mut(NONCE_LEN + TAG_LEN);
        let (nonce, tag) = head.split_at(NONCE_LEN);
        self.cipher
            .open(Nonce::from_slice(nonce), body, Tag::from_slice(tag))
            .map_err(|_| TokenError::TamperedOrInvalid)?;

        let plaintext = buf.split_off(NONCE_LEN + TAG_LEN);
        let filename = String::from_utf8(plaintext).map_err(|_| TokenError::MalformedToken)?;
        if filename.is_empty() {
            return Err(TokenError::MalformedToken);
        }
        Ok(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::from_secret(secret.as_bytes()).unwrap()
    }

    #[test]
    fn round_trip_across_key_sizes() {
        let secrets = [
            "test-secret",
            "0123456789abcdef",
            "0123456789abcdef01234567",
            "0123456789abcdef0123456789abcdef",
            "a much longer operator secret that is hashed down",
        ];
        let names = ["cam1-1700000000000.jpg", "x", "caméra-été.png", "a b+c/d=e"];
        for secret in secrets {
            let c = codec(secret);
            for name in names {
                let token = c.encode(name).unwrap();
                assert_eq!(c.decode(&token).unwrap(), name, "{c:?} {name}");
            }
        }
    }

    #[test]
    fn debug_reports_cipher_not_key() {
        assert_eq!(format!("{:?}", codec("0123456789abcdef")), "TokenCodec(AES-128-GCM-SIV)");
        assert_eq!(
            format!("{:?}", codec("0123456789abcdef01234567")),
            "TokenCodec(AES-192-GCM-SIV)"
        );
        assert_eq!(format!("{:?}", codec("test-secret")), "TokenCodec(AES-256-GCM-SIV)");
    }

    #[test]
    fn token_hides_filename_and_is_url_safe() {
        let token = codec("test-secret").encode("cam1-1700000000000.jpg").unwrap();
        assert!(!token.contains("cam1"));
        assert!(token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
        assert_eq!(token.len(), frame::encoded_len(NONCE_LEN + TAG_LEN + 22));
    }

    #[test]
    fn same_filename_yields_distinct_tokens() {
        let c = codec("test-secret");
        let a = c.encode("cam1-1700000000000.jpg").unwrap();
        let b = c.encode("cam1-1700000000000.jpg").unwrap();
        assert_ne!(a, b);
        assert_eq!(c.decode(&a).unwrap(), "cam1-1700000000000.jpg");
        assert_eq!(c.decode(&b).unwrap(), "cam1-1700000000000.jpg");
    }

    #[test]
    fn any_single_bit_flip_is_detected() {
        let c = codec("test-secret");
        let token = c.encode("cam1-1700000000000.jpg").unwrap();
        let raw = frame::decode(&token).unwrap();
        for i in 0..raw.len() {
            for bit in 0..8 {
                let mut tampered = raw.clone();
                tampered[i] ^= 1 << bit;
                let err = c.decode(&frame::encode(&tampered)).unwrap_err();
                assert_eq!(err, TokenError::TamperedOrInvalid, "byte {i} bit {bit}");
            }
        }
    }

    #[test]
    fn last_character_replaced_with_x_is_rejected() {
        let c = codec("test-secret");
        // A 22-byte name gives a 50-byte frame, so the final character carries
        // four data bits and two unused bits. Tokens ending in 'w' differ from
        // 'x' only in the unused bits.
        let token = (0..2000)
            .map(|_| c.encode("cam1-1700000000000.jpg").unwrap())
            .find(|t| t.ends_with('w'))
            .expect("no token ending in 'w' after 2000 encodes");
        let altered = format!("{}x", &token[..token.len() - 1]);
        assert_eq!(c.decode(&altered).unwrap_err(), TokenError::TamperedOrInvalid);
    }

    #[test]
    fn any_last_character_substitution_is_rejected() {
        let c = codec("test-secret");
        let token = c.encode("cam1-1700000000000.jpg").unwrap();
        let (head, last) = token.split_at(token.len() - 1);
        let alphabet = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
        for ch in alphabet.chars().filter(|ch| !last.starts_with(*ch)) {
            let altered = format!("{head}{ch}");
            assert_eq!(
                c.decode(&altered).unwrap_err(),
                TokenError::TamperedOrInvalid,
                "{altered}"
            );
        }
    }

    #[test]
    fn cross_key_rejected() {
        let token = codec("key-one").encode("cam1-1700000000000.jpg").unwrap();
        assert_eq!(
            codec("key-two").decode(&token).unwrap_err(),
            TokenError::TamperedOrInvalid
        );
    }

    #[test]
    fn short_frames_are_malformed() {
        let c = codec("test-secret");
        assert_eq!(c.decode("").unwrap_err(), TokenError::MalformedToken);
        let short = frame::encode(&[0u8; NONCE_LEN + TAG_LEN - 1]);
        assert_eq!(c.decode(&short).unwrap_err(), TokenError::MalformedToken);
    }

    #[test]
    fn empty_ciphertext_frame_fails_authentication() {
        let c = codec("test-secret");
        let bare = frame::encode(&[0u8; NONCE_LEN + TAG_LEN]);
        assert_eq!(c.decode(&bare).unwrap_err(), TokenError::TamperedOrInvalid);
    }

    #[test]
    fn garbage_input_is_malformed() {
        let c = codec("test-secret");
        for bad in ["not a token", "abc$def", "====", "ab+/cd"] {
            assert_eq!(c.decode(bad).unwrap_err(), TokenError::MalformedToken, "{bad}");
        }
        let oversized = "A".repeat(MAX_TOKEN_LEN + 1);
        assert_eq!(c.decode(&oversized).unwrap_err(), TokenError::MalformedToken);
    }

    #[test]
    fn authenticated_non_utf8_plaintext_is_malformed() {
        let c = codec("test-secret");
        let nonce = [7u8; NONCE_LEN];
        let mut body = vec![0xff, 0xfe, 0xfd];
        let tag = c.cipher.seal(Nonce::from_slice(&nonce), &mut body).unwrap();
        let mut raw = nonce.to_vec();
        raw.extend_from_slice(&tag);
        raw.extend_from_slice(&body);
        assert_eq!(
            c.decode(&frame::encode(&raw)).unwrap_err(),
            TokenError::MalformedToken
        );
    }

    #[test]
    fn filename_length_bounds() {
        let c = codec("test-secret");
        assert!(matches!(c.encode(""), Err(TokenError::Encoding(_))));
        let longest = "a".repeat(MAX_FILENAME_LEN);
        let token = c.encode(&longest).unwrap();
        assert_eq!(token.len(), MAX_TOKEN_LEN);
        assert_eq!(c.decode(&token).unwrap(), longest);
        assert!(matches!(
            c.encode(&"a".repeat(MAX_FILENAME_LEN + 1)),
            Err(TokenError::Encoding(_))
        ));
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        assert_eq!(
            TokenCodec::from_secret(b"").unwrap_err(),
            TokenError::Configuration
        );
    }

    #[test]
    fn concurrent_use_shares_one_codec() {
        let c = codec("test-secret");
        let tokens: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let c = &c;
                    s.spawn(move || {
                        (0..50)
                            .map(|i| {
                                let name = format!("cam{t}-{i}.jpg");
                                let token = c.encode(&name).unwrap();
                                assert_eq!(c.decode(&token).unwrap(), name);
                                token
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });
        let unique: HashSet<_> = tokens.iter().collect();
        assert_eq!(unique.len(), tokens.len());
    }
}
