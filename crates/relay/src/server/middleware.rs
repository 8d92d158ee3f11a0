//! Axum middleware layers applied to the router.
//!
//! Includes the API key gate, request tracing and timeout enforcement.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use common::ServiceError;
use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use super::error::ApiError;
use super::state::AppState;

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const API_KEY_MAC_KEY: &[u8] = b"relay/api-key";

type HmacSha256 = Hmac<Sha256>;

/// Constant-time verifier for the shared API key.
///
/// Only an HMAC tag of the expected key is kept; presented keys are tagged
/// the same way and compared with [`Mac::verify_slice`].
pub struct ApiKey {
    tag: Vec<u8>,
}

impl ApiKey {
    pub fn new(expected: &str) -> Result<Self, InvalidLength> {
        let mut mac = HmacSha256::new_from_slice(API_KEY_MAC_KEY)?;
        mac.update(expected.as_bytes());
        Ok(Self {
            tag: mac.finalize().into_bytes().to_vec(),
        })
    }

    /// Returns `true` if `presented` equals the configured key.
    pub fn verify(&self, presented: &str) -> bool {
        let Ok(mut mac) = HmacSha256::new_from_slice(API_KEY_MAC_KEY) else {
            return false;
        };
        mac.update(presented.as_bytes());
        mac.verify_slice(&self.tag).is_ok()
    }
}

/// Reject the request with `401` unless it carries the correct `X-API-Key`.
pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let authorised = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|k| state.api_key.verify(k))
        .unwrap_or(false);

    if authorised {
        return next.run(req).await;
    }
    warn!(path = %req.uri().path(), "rejected request with missing or invalid API key");
    ApiError::from(ServiceError::Unauthorized("Invalid API key.".into())).into_response()
}
