//! Slug resolution and availability endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use crate::api::error_response;
use crate::database::traits::UniquenessOracle;
use crate::resolver::SlugResolver;
use crate::schema::{AvailabilityResponse, ResolveQuery};
use crate::{Error, INVALID_FORMAT_MESSAGE};

/// Handler for GET /api/namespaces/{namespace}/resolve
///
/// Resolves a display name into a slug that is free in the namespace.
///
/// Query parameters:
/// - name: Display name to derive the slug from
///
/// Response:
/// ```json
/// {
///   "slug": "my-button-2",
///   "base": "my-button",
///   "attempts": 3
/// }
/// ```
///
/// Status codes:
/// - 200: resolved
/// - 409: no free slug within the attempt bound
/// - 503: the uniqueness oracle failed or timed out
pub async fn resolve_slug_handler<O: UniquenessOracle>(
    State(resolver): State<Arc<SlugResolver<O>>>,
    Path(namespace): Path<String>,
    Query(query): Query<ResolveQuery>,
) -> Response {
    match resolver.resolve(&namespace, &query.name).await {
        Ok(resolved) => (StatusCode::OK, Json(resolved)).into_response(),
        Err(error) => {
            tracing::warn!(
                namespace = %namespace,
                name = %query.name,
                %error,
                "failed to resolve slug"
            );
            error_response(&error)
        }
    }
}

/// Handler for GET /api/namespaces/{namespace}/slugs/{slug}
///
/// Checks whether a user-supplied slug is free in the namespace. A malformed
/// slug is a verdict, not a failure:
///
/// ```json
/// {
///   "slug": "Invalid Slug!",
///   "available": false,
///   "error": "Invalid slug format"
/// }
/// ```
///
/// Status codes:
/// - 200: verdict in body
/// - 503: the uniqueness oracle failed or timed out
pub async fn check_slug_handler<O: UniquenessOracle>(
    State(resolver): State<Arc<SlugResolver<O>>>,
    Path((namespace, slug)): Path<(String, String)>,
) -> Response {
    match resolver.check(&namespace, &slug).await {
        Ok(available) => (
            StatusCode::OK,
            Json(AvailabilityResponse {
                slug,
                available,
                error: None,
            }),
        )
            .into_response(),
        Err(Error::InvalidFormat(_)) => (
            StatusCode::OK,
            Json(AvailabilityResponse {
                slug,
                available: false,
                error: Some(INVALID_FORMAT_MESSAGE.to_string()),
            }),
        )
            .into_response(),
        Err(error) => {
            tracing::warn!(
                namespace = %namespace,
                slug = %slug,
                %error,
                "failed to check slug availability"
            );
            error_response(&error)
        }
    }
}
