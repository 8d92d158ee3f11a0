//! Mapping of [`ServiceError`] onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{protocol::ErrorResponse, ServiceError};

/// Handler error: a [`ServiceError`] rendered as a JSON [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::new(self.0.code(), self.0.message());
        (status, Json(body)).into_response()
    }
}

/// The single "not found" response.
///
/// Served by the router fallback and by every failure of the attachment
/// route, so callers cannot distinguish a malformed token, a forged one and
/// a missing file.
pub fn not_found() -> Response {
    ApiError(ServiceError::NotFound(
        "the requested resource does not exist".into(),
    ))
    .into_response()
}
