//! Data models for the endpoint checker.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---

/// A monitored endpoint as persisted by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EndpointRecord {
    // ---
    pub id: String,
    pub target_url: String,
    pub is_active: bool,
    /// Seconds since the Unix epoch.
    pub created_at: i64,
}

impl EndpointRecord {
    /// Build a fresh record for `target_url` with a server-side id and
    /// creation time. New records are always active.
    pub fn new(target_url: impl Into<String>) -> Self {
        // ---
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().timestamp();
        tracing::debug!("New record {} created at {}", id, created_at);

        Self {
            id,
            target_url: target_url.into(),
            is_active: true,
            created_at,
        }
    }
}

/// Body of `POST /api/v1/urls/`
#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub target_url: String,
}

/// Body of `PUT /api/v1/urls/{id}`
#[derive(Debug, Deserialize)]
pub struct UpdateUrlRequest {
    pub is_active: bool,
}

/// Every response body is wrapped in a `message` envelope.
#[derive(Debug, Serialize)]
pub struct MessageResponse<T> {
    pub message: T,
}

impl<T> MessageResponse<T> {
    pub fn new(message: T) -> Self {
        Self { message }
    }
}
