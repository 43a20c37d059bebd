//! Endpoint checker: a small REST API for registering URLs to monitor and a
//! liveness checker that periodically probes the active ones.

pub mod checker;
pub mod config;
pub mod error;
pub mod models;
pub mod probe;
pub mod routes;
pub mod scheduler;
pub mod schema;
pub mod store;

use axum::Router;

pub use config::Config;

// Re-exported for routes/*.rs and integration tests so they only need the
// crate root.
pub use checker::{CheckReport, Checker, ProbeOutcome};
pub use models::EndpointRecord;
pub use store::{MemoryStore, PgStore, RecordStore, SharedStore};

// ---

/// Build the full HTTP application over `store`.
pub fn build_app(store: SharedStore, config: Config) -> Router {
    routes::router(store, config)
}
