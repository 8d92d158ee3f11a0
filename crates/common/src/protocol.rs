//! Request and response bodies exchanged over the relay's HTTP API.
//!
//! Field names match what the camera firmware and operator tooling already
//! send and expect, which is why some of them are terse (`f`).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Upload endpoint
// ---------------------------------------------------------------------------

/// Successful response body for `POST /upload`.
///
/// `f` is the opaque attachment token for the stored image, never the
/// on-disk filename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Attachment token usable with `GET /attachment/{token}`.
    pub f: String,
}

// ---------------------------------------------------------------------------
// List endpoint
// ---------------------------------------------------------------------------

/// Response body for `GET /list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    /// Stored filenames, sorted.
    pub files: Vec<String>,
}

// ---------------------------------------------------------------------------
// Notification endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /notification`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Message text delivered to subscribers.
    pub message: String,
    /// Topic on the push server.
    pub topic: String,
    /// Optional attachment token; the provider fetches the image through
    /// the unauthenticated attachment route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"not_found"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether the upload directory exists and is a directory.
    pub upload_dir_ready: bool,
}
