use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tokio_postgres::error::SqlState;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::StorageUnavailable(ref err) => {
                // Detail stays in the log; the client only sees a generic message
                tracing::error!("Offer storage failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_UNAVAILABLE",
                    "Storage is temporarily unavailable".to_string(),
                )
            }
            ApiError::NotFound(ref resource) => {
                tracing::debug!("Resource not found: {}", resource);
                (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{} not found", resource),
                )
            }
            ApiError::Internal(ref err) => {
                tracing::error!("Internal server error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

// PostgreSQL error mapping
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.code() {
            Some(&SqlState::UNDEFINED_TABLE) => {
                ApiError::StorageUnavailable(format!("offers table is missing: {}", err))
            }
            Some(&SqlState::INSUFFICIENT_PRIVILEGE) => {
                ApiError::StorageUnavailable(format!("access denied: {}", err))
            }
            Some(code) => ApiError::StorageUnavailable(format!(
                "query failed ({}): {}",
                code.code(),
                err
            )),
            None => ApiError::StorageUnavailable(format!("connection error: {}", err)),
        }
    }
}

// Connection pool error mapping
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                tracing::warn!("Database connection pool timeout: {}", err);
                ApiError::StorageUnavailable(format!("pool timeout: {}", err))
            }
            deadpool_postgres::PoolError::Closed => {
                ApiError::StorageUnavailable("connection pool is closed".to_string())
            }
            deadpool_postgres::PoolError::NoRuntimeSpecified => {
                ApiError::Internal(anyhow::anyhow!("Database pool has no runtime: {}", err))
            }
            _ => ApiError::StorageUnavailable(format!("pool error: {}", err)),
        }
    }
}

/// Failures raised while applying or reverting the offers schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// `apply` ran against a table that already exists.
    #[error("Schema conflict: table '{table}' already exists")]
    Conflict { table: String },

    /// `revert` ran against a table that does not exist.
    #[error("Schema missing: table '{table}' does not exist")]
    Missing { table: String },

    #[error("Schema storage error: {0}")]
    Storage(String),
}

impl SchemaError {
    pub fn conflict(table: impl Into<String>) -> Self {
        Self::Conflict { table: table.into() }
    }

    pub fn missing(table: impl Into<String>) -> Self {
        Self::Missing { table: table.into() }
    }
}

impl From<tokio_postgres::Error> for SchemaError {
    fn from(err: tokio_postgres::Error) -> Self {
        SchemaError::Storage(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for SchemaError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        SchemaError::Storage(err.to_string())
    }
}
