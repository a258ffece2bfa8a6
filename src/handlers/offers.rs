// Offer handlers
// HTTP handlers for the offer listing

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;

use crate::{error::ApiError, repository::OfferRepository};

/// List all offers ordered by id
/// GET /offers
///
/// `serde_json` writes whole floats with a fractional part (`1.0`), so
/// decimal values keep their notation in the response body.
pub async fn list_offers(
    State(repository): State<Arc<dyn OfferRepository>>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Fetching all offers");

    let offers = repository.list_all().await?;

    info!("Retrieved {} offers", offers.len());
    Ok((StatusCode::OK, Json(offers)))
}
