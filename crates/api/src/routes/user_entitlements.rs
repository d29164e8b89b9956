//! User entitlement endpoint handlers, including the reconciliation engine
//! entry points (per-order generation and batch generation).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{GenerateOutcome, ReconciliationService};
use domain::models::reports::BatchGenerateReport;
use domain::models::user_entitlement::{
    CreateUserEntitlementRequest, EntitlementFilter, UpdateUserEntitlementRequest,
    UserEntitlementResponse,
};
use domain::models::UserEntitlement;
use persistence::entities::UserEntitlementEntity;
use persistence::repositories::{
    EntitlementRowFilter, EntitlementRuleRepository, EntitlementUpdate, OrderRepository,
    OrderUpdate, UserEntitlementRepository,
};
use shared::pagination::{PageParams, Paginated};

/// Response for the per-order generation endpoint.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// What the engine did: "generated", "retired", or "self_healed".
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlement: Option<UserEntitlementResponse>,
}

/// Generate or retire the entitlement for one order.
///
/// POST /api/v1/orders/:order_id/generate-entitlement
pub async fn generate_from_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let service = ReconciliationService::new(state.pool.clone());
    let response = match service.generate_from_order(&order_id).await? {
        GenerateOutcome::Generated(entitlement) => GenerateResponse {
            outcome: "generated",
            entitlement: Some(entitlement.into()),
        },
        GenerateOutcome::Retired(entitlement) => GenerateResponse {
            outcome: "retired",
            entitlement: Some(entitlement.into()),
        },
        GenerateOutcome::SelfHealed { .. } => GenerateResponse {
            outcome: "self_healed",
            entitlement: None,
        },
    };
    Ok(Json(response))
}

/// Run batch generation over every pending order.
///
/// POST /api/v1/user-entitlements/batch-generate
pub async fn batch_generate(
    State(state): State<AppState>,
) -> Result<Json<BatchGenerateReport>, ApiError> {
    let service = ReconciliationService::new(state.pool.clone());
    let report = service.batch_generate().await?;
    Ok(Json(report))
}

/// Manually grant an entitlement to a phone number, bypassing any order.
/// The grant starts inactive until the login flow activates it.
///
/// POST /api/v1/user-entitlements
pub async fn create_entitlement(
    State(state): State<AppState>,
    Json(request): Json<CreateUserEntitlementRequest>,
) -> Result<(StatusCode, Json<UserEntitlementResponse>), ApiError> {
    request.validate()?;

    let service = ReconciliationService::new(state.pool.clone());
    let entitlement = service
        .create_manual_entitlement(&request.phone, &request.rule_id)
        .await?;

    Ok((StatusCode::CREATED, Json(entitlement.into())))
}

/// List non-deleted entitlements, paginated, newest first.
///
/// GET /api/v1/user-entitlements
pub async fn list_entitlements(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<UserEntitlementResponse>>, ApiError> {
    let page = params.clamp();
    let repo = UserEntitlementRepository::new(state.pool.clone());
    let (items, total) = repo.list(page).await?;

    Ok(Json(Paginated::new(to_responses(items), total, page)))
}

/// Filtered entitlement listing.
///
/// POST /api/v1/user-entitlements/filter
pub async fn filter_entitlements(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    Json(filter): Json<EntitlementFilter>,
) -> Result<Json<Paginated<UserEntitlementResponse>>, ApiError> {
    let page = params.clamp();

    let row_filter = EntitlementRowFilter {
        entitlement_id: filter.entitlement_id.clone(),
        phone: filter.phone.clone(),
        order_id: filter.order_id.clone(),
        rule_id: filter.rule_id.clone(),
        course_name: filter.course_name.clone(),
        product_name: filter.product_name.clone(),
        is_active: filter.is_active,
    };

    let repo = UserEntitlementRepository::new(state.pool.clone());
    let (items, total) = repo.find_by_filter(&row_filter, page).await?;

    Ok(Json(Paginated::new(to_responses(items), total, page)))
}

/// Get an entitlement by id.
///
/// GET /api/v1/user-entitlements/:entitlement_id
pub async fn get_entitlement(
    State(state): State<AppState>,
    Path(entitlement_id): Path<String>,
) -> Result<Json<UserEntitlementResponse>, ApiError> {
    let repo = UserEntitlementRepository::new(state.pool.clone());
    let entity = repo.find_by_id(&entitlement_id).await?.ok_or_else(|| {
        ApiError::NotFound(format!("User entitlement {} not found", entitlement_id))
    })?;
    Ok(Json(UserEntitlement::from(entity).into()))
}

/// Update an entitlement's allow-listed mutable fields.
///
/// Swapping `rule_id` re-denormalizes the product reference from the new
/// rule. Hand-linking an `order_id` marks that order generated and
/// not-refunded.
///
/// PUT /api/v1/user-entitlements/:entitlement_id
pub async fn update_entitlement(
    State(state): State<AppState>,
    Path(entitlement_id): Path<String>,
    Json(request): Json<UpdateUserEntitlementRequest>,
) -> Result<Json<UserEntitlementResponse>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::Validation("No updatable fields provided".into()));
    }

    let daily_remaining = request.daily_remaining().map_err(ApiError::from)?;
    let end_date = request.end_date().map_err(ApiError::from)?;

    let repo = UserEntitlementRepository::new(state.pool.clone());
    repo.find_by_id(&entitlement_id).await?.ok_or_else(|| {
        ApiError::NotFound(format!("User entitlement {} not found", entitlement_id))
    })?;

    // A rule swap re-denormalizes the product reference from the new rule.
    let (product_name, ai_product_id) = match &request.rule_id {
        Some(rule_id) => {
            let rule_repo = EntitlementRuleRepository::new(state.pool.clone());
            let rule = rule_repo
                .find_by_id(rule_id)
                .await?
                .filter(|r| !r.is_deleted)
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Entitlement rule {} not found", rule_id))
                })?;
            (Some(rule.product_name), Some(rule.ai_product_id))
        }
        None => (None, None),
    };

    // Hand-linking an order marks it generated and not refunded.
    if let Some(order_id) = &request.order_id {
        let order_repo = OrderRepository::new(state.pool.clone());
        order_repo
            .update_fields(
                order_id,
                &OrderUpdate {
                    is_refund: Some(false),
                    is_generate: Some(true),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Order {} not found", order_id)))?;
    }

    let entity = repo
        .update_fields(
            &entitlement_id,
            &EntitlementUpdate {
                phone: request.phone.clone(),
                rule_id: request.rule_id.clone(),
                product_name,
                ai_product_id,
                end_date,
                daily_remaining,
                is_active: request.is_active,
                order_id: request.order_id.clone(),
            },
        )
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("User entitlement {} not found", entitlement_id))
        })?;

    info!(entitlement_id = %entitlement_id, "User entitlement updated");
    Ok(Json(UserEntitlement::from(entity).into()))
}

/// Soft-delete an entitlement.
///
/// DELETE /api/v1/user-entitlements/:entitlement_id
pub async fn delete_entitlement(
    State(state): State<AppState>,
    Path(entitlement_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = UserEntitlementRepository::new(state.pool.clone());
    repo.find_by_id(&entitlement_id).await?.ok_or_else(|| {
        ApiError::NotFound(format!("User entitlement {} not found", entitlement_id))
    })?;

    repo.soft_delete(&entitlement_id).await?;
    info!(entitlement_id = %entitlement_id, "User entitlement soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn to_responses(items: Vec<UserEntitlementEntity>) -> Vec<UserEntitlementResponse> {
    items
        .into_iter()
        .map(|e| UserEntitlement::from(e).into())
        .collect()
}
