//! Storage capability consumed by the offer handlers.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::Offer;

#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// All offers ordered by ascending `id`.
    ///
    /// Either every row is returned or the call fails; callers never see a
    /// partial listing.
    async fn list_all(&self) -> Result<Vec<Offer>, ApiError>;
}
