//! Administrative endpoints: record counts, job status, and manual job
//! re-triggering for operational recovery.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::jobs::JobStatus;
use crate::services::{QuotaResetService, ReconciliationService};
use domain::models::reports::{QuotaResetReport, SyncReport};
use persistence::repositories::{
    AiProductRepository, CourseRepository, EntitlementRuleRepository, OrderRepository,
    UserEntitlementRepository,
};

/// Record counts across the system, for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub courses: i64,
    pub ai_products: i64,
    pub entitlement_rules: i64,
    pub orders: i64,
    pub user_entitlements: i64,
}

/// Current non-deleted record counts.
///
/// GET /api/v1/admin/stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<AdminStats>, ApiError> {
    let courses = CourseRepository::new(state.pool.clone())
        .count_active()
        .await?;
    let ai_products = AiProductRepository::new(state.pool.clone())
        .count_active()
        .await?;
    let entitlement_rules = EntitlementRuleRepository::new(state.pool.clone())
        .count_active()
        .await?;
    let orders = OrderRepository::new(state.pool.clone())
        .count_active()
        .await?;
    let user_entitlements = UserEntitlementRepository::new(state.pool.clone())
        .count_active()
        .await?;

    Ok(Json(AdminStats {
        courses,
        ai_products,
        entitlement_rules,
        orders,
        user_entitlements,
    }))
}

/// One job's status row.
#[derive(Debug, Serialize)]
pub struct JobStatusEntry {
    pub name: String,
    #[serde(flatten)]
    pub status: JobStatus,
}

/// Last-run status of every scheduled job.
///
/// GET /api/v1/admin/jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobStatusEntry>> {
    let map = state.job_status.read().await;
    let mut entries: Vec<JobStatusEntry> = map
        .iter()
        .map(|(name, status)| JobStatusEntry {
            name: (*name).to_string(),
            status: status.clone(),
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Json(entries)
}

/// Manually trigger the order sync sweep.
///
/// POST /api/v1/admin/jobs/order-sync/run
pub async fn run_order_sync(
    State(state): State<AppState>,
) -> Result<Json<SyncReport>, ApiError> {
    info!("Order sync manually triggered");
    let service = ReconciliationService::new(state.pool.clone());
    let report = service
        .sync_orders_to_entitlements(
            state.config.scheduler.order_sync_hour,
            state.config.scheduler.sync_max_retries,
        )
        .await?;
    Ok(Json(report))
}

/// Manually trigger the daily quota reset.
///
/// POST /api/v1/admin/jobs/quota-reset/run
pub async fn run_quota_reset(
    State(state): State<AppState>,
) -> Result<Json<QuotaResetReport>, ApiError> {
    info!("Quota reset manually triggered");
    let service = QuotaResetService::new(state.pool.clone());
    let report = service.reset_daily_quota().await?;
    Ok(Json(report))
}
