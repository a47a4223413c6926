//! Route modules for the PDF toolkit server

pub mod documents;
pub mod extract;
pub mod health;
pub mod upload;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::require_basic_auth;
use crate::error::{AppError, Result};
use crate::pdf::{MAX_DPI, MIN_DPI};
use crate::state::AppState;

/// Build the full application router
///
/// `/health` is open; everything under `/api` requires Basic auth.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config().max_upload_bytes();

    let api = Router::new()
        .route("/info", post(extract::info))
        .route("/extract-text", post(extract::text))
        .route("/extract-images", post(extract::images))
        .route("/extract-tables", post(extract::tables))
        .route("/extract-all-fields", post(extract::all_fields))
        .route("/get-checkboxes", post(extract::checkboxes))
        .route("/chapter-boundaries", post(extract::chapters))
        .route("/split-pages", post(documents::split))
        .route("/render", post(documents::render))
        .route("/redact", post(documents::redact))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .layer(DefaultBodyLimit::max(body_limit));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    user = tracing::field::Empty,
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

/// Reject resolutions outside the supported range
pub(crate) fn check_dpi(dpi: u32) -> Result<u32> {
    if (MIN_DPI..=MAX_DPI).contains(&dpi) {
        Ok(dpi)
    } else {
        Err(AppError::BadRequest(format!(
            "dpi must be between {} and {}, got {}",
            MIN_DPI, MAX_DPI, dpi
        )))
    }
}
