//! Axum request handlers for all service endpoints.

use std::path::Path as FsPath;

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use common::protocol::{HealthResponse, ListResponse, NotificationRequest, UploadResponse};
use common::ServiceError;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

use super::error::{self, ApiError};
use super::state::AppState;
use crate::notify::NotifyError;
use crate::storage::{ImageKind, StorageError};

/// Multipart field carrying the uploaded image.
const UPLOAD_FIELD: &str = "file";

/// `GET /list` — names of all stored images.
pub async fn list_images(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
    let files = state.store.list().await.map_err(|e| {
        error!(error = %e, "failed to list upload directory");
        ServiceError::Internal("failed to list files".into())
    })?;
    Ok(Json(ListResponse { files }))
}

/// `GET /get-file/{filename}` — stream a stored image by its real name.
pub async fn get_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = match state.store.resolve(&filename).await {
        Ok(p) => p,
        Err(StorageError::InvalidName | StorageError::NotFound) => {
            return Err(ServiceError::NotFound("File not found.".into()).into());
        }
        Err(e) => {
            error!(error = %e, "file lookup failed");
            return Err(ServiceError::Internal("file lookup failed".into()).into());
        }
    };
    serve_file(&path).await.map_err(|e| {
        error!(error = %e, "failed to open stored file");
        ApiError::from(ServiceError::Internal("failed to read file".into()))
    })
}

/// `GET /attachment/{token}` — stream the image a token refers to.
///
/// No API key is required: possession of a valid token is the credential.
/// Every failure, from an undecodable path segment to a missing file, yields
/// the same 404 as an unknown route.
pub async fn get_attachment(
    State(state): State<AppState>,
    token: Result<Path<String>, PathRejection>,
) -> Response {
    let Ok(Path(token)) = token else {
        return error::not_found();
    };
    let filename = match state.codec.decode(&token) {
        Ok(f) => f,
        Err(e) => {
            debug!(error = %e, "attachment token rejected");
            return error::not_found();
        }
    };
    let path = match state.store.resolve(&filename).await {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "attachment lookup failed");
            return error::not_found();
        }
    };
    match serve_file(&path).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(error = %e, "failed to open attachment");
            error::not_found()
        }
    }
}

/// `POST /upload` — store a JPEG or PNG and return its attachment token.
///
/// Expects a multipart body with the image in the `file` field. Responds
/// `201 {"f": "<token>"}`; the stored filename is never returned.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let kind = field
            .content_type()
            .and_then(ImageKind::from_content_type)
            .ok_or_else(|| {
                ServiceError::BadRequest(
                    "Invalid file type. Only JPEG and PNG are allowed.".into(),
                )
            })?;
        let original_name = field.file_name().map(str::to_owned);
        let data: Bytes = field.bytes().await.map_err(bad_multipart)?;
        if !kind.matches(&data) {
            return Err(ServiceError::BadRequest(
                "File content does not match its declared type.".into(),
            )
            .into());
        }

        let filename = state
            .store
            .save(original_name.as_deref(), kind, &data)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to store upload");
                ServiceError::Internal("failed to store file".into())
            })?;

        let token = match state.codec.encode(&filename) {
            Ok(t) => t,
            Err(e) => {
                error!(error = %e, "failed to issue attachment token");
                if let Err(e) = state.store.remove(&filename).await {
                    warn!(error = %e, "failed to roll back upload");
                }
                return Err(ServiceError::Internal("failed to issue attachment token".into()).into());
            }
        };

        info!(bytes = data.len(), kind = kind.extension(), "image uploaded");
        return Ok((StatusCode::CREATED, Json(UploadResponse { f: token })));
    }

    Err(ServiceError::BadRequest(format!("missing multipart field `{UPLOAD_FIELD}`")).into())
}

/// `POST /notification` — relay a message to the push notification server.
pub async fn post_notification(
    State(state): State<AppState>,
    Json(req): Json<NotificationRequest>,
) -> Result<StatusCode, ApiError> {
    let notifier = state.notifier.as_ref().ok_or_else(|| {
        ServiceError::Unavailable("push notifications are not configured".into())
    })?;

    if let Some(token) = &req.attachment {
        if state.codec.decode(token).is_err() {
            return Err(ServiceError::BadRequest("invalid attachment token".into()).into());
        }
    }

    notifier
        .publish(&req.topic, &req.message, req.attachment.as_deref())
        .await
        .map_err(|e| match e {
            NotifyError::InvalidTopic => ServiceError::BadRequest("invalid topic".into()),
            other => {
                warn!(error = %other, "notification relay failed");
                ServiceError::Upstream("notification provider request failed".into())
            }
        })?;

    Ok(StatusCode::OK)
}

/// `GET /health` — liveness and readiness check.
///
/// Returns `200 OK` when the upload directory is usable and
/// `503 Service Unavailable` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let upload_dir_ready = state.store.is_ready().await;
    let (status_code, status_str) = if upload_dir_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    let body = HealthResponse {
        status: status_str.into(),
        upload_dir_ready,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> Response {
    error::not_found()
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> ApiError {
    ServiceError::BadRequest(format!("invalid multipart body: {e}")).into()
}

/// Stream the file at `path`, typed by its extension.
async fn serve_file(path: &FsPath) -> std::io::Result<Response> {
    let file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    let content_type = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(ImageKind::from_filename)
        .map(ImageKind::content_type)
        .unwrap_or("application/octet-stream");

    let mut resp = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    Ok(resp)
}
