use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tracing::info;

use super::AppState;
use crate::error::ApiError;
use crate::models::{CreateUrlRequest, EndpointRecord, MessageResponse, UpdateUrlRequest};
use crate::store::{scan_all, ScanFilter};

const SUCCESSFUL: &str = "Successful";

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route(
            "/api/v1/urls/",
            get(list_urls).post(create_url).put(missing_id),
        )
        .route("/api/v1/urls/{id}", put(update_url))
}

/// Handle `POST /api/v1/urls/`.
async fn create_url(
    State((store, _config)): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse<&'static str>>, ApiError> {
    // ---
    let request: CreateUrlRequest = parse_body(&body)?;
    if request.target_url.trim().is_empty() {
        return Err(ApiError::invalid("target_url is missing from request"));
    }

    let record = EndpointRecord::new(request.target_url);
    info!("Add record with id: {}", record.id);
    store.put(&record).await?;

    Ok(Json(MessageResponse::new(SUCCESSFUL)))
}

/// Handle `GET /api/v1/urls/`. Returns every record, active or not.
async fn list_urls(
    State((store, config)): State<AppState>,
) -> Result<Json<MessageResponse<Vec<EndpointRecord>>>, ApiError> {
    // ---
    let records = scan_all(
        store.as_ref(),
        ScanFilter::All,
        config.scan_page_size as usize,
    )
    .await?;

    info!("Listing {} records", records.len());
    Ok(Json(MessageResponse::new(records)))
}

/// Handle `PUT /api/v1/urls/{id}`.
///
/// Only `is_active` changes. An unknown id is not an error: the store treats
/// it as a no-op and the caller still gets a success response.
async fn update_url(
    Path(id): Path<String>,
    State((store, _config)): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse<&'static str>>, ApiError> {
    // ---
    if id.trim().is_empty() {
        return Err(ApiError::invalid("Id is missing from request"));
    }
    let request: UpdateUrlRequest = parse_body(&body)?;

    info!("Update record with id: {} (is_active={})", id, request.is_active);
    store.set_active(&id, request.is_active).await?;

    Ok(Json(MessageResponse::new(SUCCESSFUL)))
}

/// `PUT /api/v1/urls/` without an id in the path.
async fn missing_id() -> ApiError {
    ApiError::invalid("Id is missing from request")
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    // ---
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::invalid("Body is missing from request"));
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::invalid(format!("Invalid request body: {e}")))
}
