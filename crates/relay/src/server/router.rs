//! Axum router construction.

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// Operator routes sit behind the API key gate; `/attachment/{token}` and
/// `/health` are public.
pub fn build(state: AppState) -> Router {
    let operator = Router::new()
        .route("/list", get(handlers::list_images))
        .route("/get-file/:filename", get(handlers::get_file))
        .route("/upload", post(handlers::upload_image))
        .route("/notification", post(handlers::post_notification))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ));

    Router::new()
        .merge(operator)
        .route("/attachment/:token", get(handlers::get_attachment))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .with_state(state)
}
