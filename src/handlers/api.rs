use crate::{
    error::ServiceError,
    models::{ShortenRequest, UrlEntry, UrlStats},
    service, AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

/// Most URLs a single request to `POST /api/shorten` may carry.
pub const MAX_BATCH_SIZE: usize = 5;

/// The shorten endpoint accepts either a single request object or an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ShortenBody {
    Single(ShortenRequest),
    Batch(Vec<ShortenRequest>),
}

/// POST /api/shorten
///
/// Oversized batches are rejected before any request is processed. Service
/// failures surface with their own status codes (see `ServiceError`).
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ShortenBody>, JsonRejection>,
) -> Result<Json<Vec<UrlEntry>>, ServiceError> {
    // Malformed bodies (bad JSON, non-integer validityMinutes, …) get the
    // same JSON error envelope as every other rejection.
    let Json(body) = body.map_err(|rejection| {
        tracing::warn!("malformed shorten request body: {}", rejection.body_text());
        ServiceError::InvalidBody(rejection.body_text())
    })?;

    let requests = match body {
        ShortenBody::Single(request) => vec![request],
        ShortenBody::Batch(requests) => requests,
    };

    if requests.len() > MAX_BATCH_SIZE {
        tracing::error!(count = requests.len(), "too many URLs requested");
        return Err(ServiceError::BatchTooLarge {
            got: requests.len(),
            max: MAX_BATCH_SIZE,
        });
    }

    let results = service::shorten_urls(&state.store, requests).await?;
    tracing::info!(count = results.len(), "URLs shortened successfully");

    Ok(Json(results))
}

/// GET /api/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<Vec<UrlStats>> {
    let stats = service::get_all_urls(&state.store).await;
    tracing::info!(count = stats.len(), "stats retrieved");
    Json(stats)
}
