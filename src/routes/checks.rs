//! Manual trigger for the liveness checker.
//!
//! Lets an external scheduler (cron, an event rule) drive ticks over HTTP
//! instead of, or in addition to, the in-process scheduler. Any request body
//! is ignored; a tick depends only on the current store contents.

use axum::{extract::State, routing::post, Json, Router};

use super::AppState;
use crate::checker::Checker;
use crate::error::ApiError;
use crate::models::MessageResponse;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/checks/", post(run_check))
}

/// Handle `POST /api/v1/checks/`.
async fn run_check(
    State((store, config)): State<AppState>,
) -> Result<Json<MessageResponse<&'static str>>, ApiError> {
    // ---
    let report = Checker::from_config(store, &config).run().await?;
    tracing::info!("Triggered check probed {} endpoints", report.outcomes.len());

    Ok(Json(MessageResponse::new("Success")))
}
