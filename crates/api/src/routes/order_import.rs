//! Bulk order import endpoint handler.

use axum::{extract::State, Json};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::OrderImportService;
use domain::models::reports::{ImportOrderRow, ImportReport};

/// Request body: pre-parsed spreadsheet rows. The column-header mapping
/// (手机号/课程标题/三方支付单号/支付时间/退款状态 → these keys) happens in
/// the external parser before the rows reach this endpoint.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct ImportOrdersRequest {
    #[validate(length(min = 1, max = 5000, message = "rows must contain 1-5000 items"))]
    pub rows: Vec<ImportOrderRow>,
}

/// Import a batch of order rows, capturing per-row failures.
///
/// POST /api/v1/orders/import
pub async fn import_orders(
    State(state): State<AppState>,
    Json(request): Json<ImportOrdersRequest>,
) -> Result<Json<ImportReport>, ApiError> {
    request.validate()?;

    let service = OrderImportService::new(state.pool.clone());
    let report = service.import_orders(request.rows).await?;
    Ok(Json(report))
}
