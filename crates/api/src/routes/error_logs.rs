//! Audit log listing endpoints.
//!
//! Operators page through these to chase down rows the bulk importer or
//! the batch generator skipped.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::ErrorLogEntry;
use persistence::repositories::ErrorLogRepository;
use shared::pagination::{PageParams, Paginated};

/// List bulk-upload failures, newest first.
///
/// GET /api/v1/order-upload-errors
pub async fn list_upload_errors(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<ErrorLogEntry>>, ApiError> {
    let page = params.clamp();
    let repo = ErrorLogRepository::new(state.pool.clone());
    let (items, total) = repo.list_upload_errors(page).await?;

    let items = items.into_iter().map(ErrorLogEntry::from).collect();
    Ok(Json(Paginated::new(items, total, page)))
}

/// List batch-generation failures, newest first.
///
/// GET /api/v1/batch-generate-errors
pub async fn list_batch_errors(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<ErrorLogEntry>>, ApiError> {
    let page = params.clamp();
    let repo = ErrorLogRepository::new(state.pool.clone());
    let (items, total) = repo.list_batch_errors(page).await?;

    let items = items.into_iter().map(ErrorLogEntry::from).collect();
    Ok(Json(Paginated::new(items, total, page)))
}
