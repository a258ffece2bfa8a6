use axum::{http::StatusCode, routing::get, Router};
use std::{sync::Arc, time::Duration};

use crate::{
    handlers::{not_found, offers::list_offers},
    middleware::create_middleware_stack,
    repository::OfferRepository,
};

/// Create the Axum router with all endpoints and middleware
pub fn create_router(repository: Arc<dyn OfferRepository>, request_timeout: Duration) -> Router {
    Router::new()
        .route(
            "/offers",
            get(list_offers).fallback(|| async { StatusCode::METHOD_NOT_ALLOWED }),
        )
        .fallback(not_found)
        .with_state(repository)
        .layer(create_middleware_stack(request_timeout))
}
