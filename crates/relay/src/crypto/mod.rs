//! Attachment token primitives.
//!
//! This module is intentionally free of HTTP and filesystem dependencies.
//! It turns the configured secret into a key and converts stored filenames
//! into opaque tokens that third parties may present without the API key.
//!
//! # Token format
//!
//! ```text
//! base64url-no-pad( nonce[12] ‖ tag[16] ‖ ciphertext[len(filename)] )
//! ```

pub mod error;
pub mod frame;
pub mod key;
pub mod token;

pub use token::TokenCodec;
