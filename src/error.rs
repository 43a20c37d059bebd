//! Error types shared by the store, the API handlers and the checker.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::MessageResponse;

/// Body returned for any failure whose detail must stay server-side.
pub const GENERIC_FAILURE: &str = "Whoops! something went wrong";

// ---

/// Failure talking to or operating on the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// The backend could not be reached at all: no pooled connection within
    /// the acquire timeout, a closed pool, or a non-sqlx backend that is down.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                StoreError::Unavailable("timed out waiting for a database connection".into())
            }
            sqlx::Error::PoolClosed => {
                StoreError::Unavailable("database connection pool is closed".into())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Errors surfaced by the registration and trigger routes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ApiError::InvalidRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        let (status, message) = match self {
            ApiError::InvalidRequest(msg) => {
                tracing::debug!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Store(err) => {
                tracing::error!("Store error: {}", err);
                (StatusCode::IM_A_TEAPOT, GENERIC_FAILURE.to_string())
            }
        };

        (status, Json(MessageResponse::new(message))).into_response()
    }
}
