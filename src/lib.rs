// Library root for the offer listing API

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;

// Re-export commonly used types
pub use db::Database;
pub use error::{ApiError, SchemaError};
pub use migration::{SchemaCatalog, SchemaManager};
pub use models::Offer;
pub use repository::OfferRepository;
pub use routes::create_router;
