//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::Unauthorized`] → 401
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::Upstream`] → 502
/// - [`ServiceError::Unavailable`] → 503
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The `X-API-Key` header is missing or does not match.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request was malformed: wrong content type, bad multipart body, invalid topic.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The requested file or attachment does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The push notification provider rejected the request or could not be reached.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// An optional collaborator (e.g. the push provider) is not configured.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::Unauthorized(_) => 401,
            ServiceError::BadRequest(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::Upstream(_) => 502,
            ServiceError::Unavailable(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in [`crate::protocol::ErrorResponse`].
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Upstream(_) => "bad_gateway",
            ServiceError::Unavailable(_) => "service_unavailable",
            ServiceError::Internal(_) => "internal_error",
        }
    }

    /// The caller-facing message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::Unauthorized(m)
            | ServiceError::BadRequest(m)
            | ServiceError::NotFound(m)
            | ServiceError::Upstream(m)
            | ServiceError::Unavailable(m)
            | ServiceError::Internal(m) => m,
        }
    }
}
