//! REST API endpoints
//!
//! This module contains the HTTP handlers for slug resolution and
//! availability checks.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

use crate::database::traits::UniquenessOracle;
use crate::resolver::SlugResolver;
use crate::Error;

pub mod slugs;

// Re-export handlers for convenience
pub use slugs::{check_slug_handler, resolve_slug_handler};

/// Create the API router with all endpoints
///
/// # Arguments
///
/// * `resolver` - Arc-wrapped resolver shared by all handlers
///
/// # Returns
///
/// An Axum Router configured with all API routes
pub fn create_api_router<O: UniquenessOracle>(resolver: Arc<SlugResolver<O>>) -> Router {
    // Axum 0.8 uses {param} syntax instead of :param
    Router::new()
        .route(
            "/namespaces/{namespace}/resolve",
            get(resolve_slug_handler::<O>),
        )
        .route(
            "/namespaces/{namespace}/slugs/{slug}",
            get(check_slug_handler::<O>),
        )
        .with_state(resolver)
}

/// Status code for a resolver error
///
/// The availability handler answers malformed slugs with a verdict instead,
/// so `InvalidFormat` only maps here for callers that surface
/// [`SlugResolver::check`] errors directly.
pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::InvalidFormat(_) => StatusCode::BAD_REQUEST,
        Error::OracleUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::ResolutionExhausted { .. } => StatusCode::CONFLICT,
    }
}

/// JSON error body with the matching status code
pub(crate) fn error_response(error: &Error) -> Response {
    (
        status_for(error),
        Json(serde_json::json!({
            "error": error.to_string()
        })),
    )
        .into_response()
}
