// Handlers module
// HTTP handlers for the REST API

pub mod offers;

use axum::http::Uri;

use crate::error::ApiError;

/// Fallback for unknown routes, rendered with the standard error body
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route {}", uri.path()))
}
