//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::crypto::TokenCodec;
use crate::notify::Notifier;
use crate::storage::ImageStore;

use super::middleware::ApiKey;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or already `Arc`-backed) so
/// that Axum can clone the state for each request without copying expensive data.
#[derive(Clone)]
pub struct AppState {
    /// Filename token codec built from the configured secret.
    pub codec: Arc<TokenCodec>,
    /// Upload directory.
    pub store: ImageStore,
    /// Verifier for the `X-API-Key` header.
    pub api_key: Arc<ApiKey>,
    /// Push notification client; `None` when no provider is configured.
    pub notifier: Option<Notifier>,
    /// Request body limit in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create a new [`AppState`] from its fully initialised parts.
    pub fn new(
        codec: TokenCodec,
        store: ImageStore,
        api_key: ApiKey,
        notifier: Option<Notifier>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            codec: Arc::new(codec),
            store,
            api_key: Arc::new(api_key),
            notifier,
            max_upload_bytes,
        }
    }
}
