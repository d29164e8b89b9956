//! Entitlement rule endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::entitlement_rule::{
    CreateEntitlementRuleRequest, EntitlementRuleResponse, RuleFilter,
    UpdateEntitlementRuleRequest, DEFAULT_DAILY_LIMIT, DEFAULT_VALIDITY_DAYS,
};
use domain::models::EntitlementRule;
use persistence::entities::EntitlementRuleEntity;
use persistence::repositories::{
    AiProductRepository, CourseRepository, EntitlementRuleRepository,
};
use shared::pagination::{PageParams, Paginated};
use shared::validation::normalize_name;

/// Create an entitlement rule for a (course, product) pair.
///
/// POST /api/v1/entitlement-rules
pub async fn create_rule(
    State(state): State<AppState>,
    Json(request): Json<CreateEntitlementRuleRequest>,
) -> Result<(StatusCode, Json<EntitlementRuleResponse>), ApiError> {
    request.validate()?;

    let course_repo = CourseRepository::new(state.pool.clone());
    let course = course_repo
        .find_by_id(&request.course_id)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or_else(|| ApiError::NotFound(format!("Course {} not found", request.course_id)))?;

    let product_repo = AiProductRepository::new(state.pool.clone());
    let product = product_repo
        .find_by_id(&request.ai_product_id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| {
            ApiError::NotFound(format!("AI product {} not found", request.ai_product_id))
        })?;

    let rule_repo = EntitlementRuleRepository::new(state.pool.clone());
    if rule_repo
        .find_active_by_pair(&course.course_id, &product.ai_product_id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "A rule for this course and AI product already exists".into(),
        ));
    }

    let entity = rule_repo
        .insert(
            &shared::ids::rule_id(),
            &course.course_id,
            &course.course_name,
            &product.ai_product_id,
            &product.ai_product_name,
            request.daily_limit.unwrap_or(DEFAULT_DAILY_LIMIT),
            request.validity_days.unwrap_or(DEFAULT_VALIDITY_DAYS),
        )
        .await?;

    info!(
        rule_id = %entity.rule_id,
        course_id = %entity.course_id,
        ai_product_id = %entity.ai_product_id,
        daily_limit = entity.daily_limit,
        validity_days = entity.validity_days,
        "Entitlement rule created"
    );
    Ok((
        StatusCode::CREATED,
        Json(EntitlementRule::from(entity).into()),
    ))
}

/// List non-deleted rules, paginated, newest first.
///
/// GET /api/v1/entitlement-rules
pub async fn list_rules(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<EntitlementRuleResponse>>, ApiError> {
    let page = params.clamp();
    let repo = EntitlementRuleRepository::new(state.pool.clone());
    let (items, total) = repo.find_by_filter(&RuleFilter::default(), page).await?;

    Ok(Json(Paginated::new(to_responses(items), total, page)))
}

/// Filtered rule listing.
///
/// POST /api/v1/entitlement-rules/filter
pub async fn filter_rules(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    Json(filter): Json<RuleFilter>,
) -> Result<Json<Paginated<EntitlementRuleResponse>>, ApiError> {
    let page = params.clamp();
    let repo = EntitlementRuleRepository::new(state.pool.clone());
    let (items, total) = repo.find_by_filter(&filter, page).await?;

    Ok(Json(Paginated::new(to_responses(items), total, page)))
}

/// Get a rule by id.
///
/// GET /api/v1/entitlement-rules/:rule_id
pub async fn get_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<Json<EntitlementRuleResponse>, ApiError> {
    let repo = EntitlementRuleRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(&rule_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Entitlement rule {} not found", rule_id)))?;
    Ok(Json(EntitlementRule::from(entity).into()))
}

/// Update a rule. The referenced course/product can be swapped by id or by
/// name; whichever side is given, both the id and the denormalized name are
/// re-resolved.
///
/// PUT /api/v1/entitlement-rules/:rule_id
pub async fn update_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
    Json(request): Json<UpdateEntitlementRuleRequest>,
) -> Result<Json<EntitlementRuleResponse>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::Validation("No updatable fields provided".into()));
    }

    let rule_repo = EntitlementRuleRepository::new(state.pool.clone());
    let existing = rule_repo
        .find_by_id(&rule_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Entitlement rule {} not found", rule_id)))?;

    let (course_id, course_name) =
        resolve_course(&state, &request, &existing).await?;
    let (ai_product_id, product_name) =
        resolve_product(&state, &request, &existing).await?;

    let daily_limit = request
        .daily_limit()
        .map_err(ApiError::from)?
        .unwrap_or(existing.daily_limit);
    let validity_days = request
        .validity_days()
        .map_err(ApiError::from)?
        .unwrap_or(existing.validity_days);

    let entity = rule_repo
        .update(
            &rule_id,
            &course_id,
            &course_name,
            &ai_product_id,
            &product_name,
            daily_limit,
            validity_days,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Entitlement rule {} not found", rule_id)))?;

    info!(rule_id = %rule_id, "Entitlement rule updated");
    Ok(Json(EntitlementRule::from(entity).into()))
}

/// Soft-delete a rule.
///
/// DELETE /api/v1/entitlement-rules/:rule_id
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = EntitlementRuleRepository::new(state.pool.clone());
    repo.find_by_id(&rule_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Entitlement rule {} not found", rule_id)))?;

    repo.soft_delete(&rule_id).await?;
    info!(rule_id = %rule_id, "Entitlement rule soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve the rule's course reference from an update request: by id if
/// given, else by name, else keep the existing reference.
async fn resolve_course(
    state: &AppState,
    request: &UpdateEntitlementRuleRequest,
    existing: &EntitlementRuleEntity,
) -> Result<(String, String), ApiError> {
    let repo = CourseRepository::new(state.pool.clone());

    if let Some(course_id) = &request.course_id {
        let course = repo
            .find_by_id(course_id)
            .await?
            .filter(|c| !c.is_deleted)
            .ok_or_else(|| ApiError::NotFound(format!("Course {} not found", course_id)))?;
        return Ok((course.course_id, course.course_name));
    }
    if let Some(course_name) = &request.course_name {
        let normalized = normalize_name(course_name);
        let course = repo
            .find_by_name(&normalized, false)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Course '{}' not found", normalized)))?;
        return Ok((course.course_id, course.course_name));
    }
    Ok((existing.course_id.clone(), existing.course_name.clone()))
}

/// Resolve the rule's product reference from an update request, mirroring
/// `resolve_course`.
async fn resolve_product(
    state: &AppState,
    request: &UpdateEntitlementRuleRequest,
    existing: &EntitlementRuleEntity,
) -> Result<(String, String), ApiError> {
    let repo = AiProductRepository::new(state.pool.clone());

    if let Some(ai_product_id) = &request.ai_product_id {
        let product = repo
            .find_by_id(ai_product_id)
            .await?
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| {
                ApiError::NotFound(format!("AI product {} not found", ai_product_id))
            })?;
        return Ok((product.ai_product_id, product.ai_product_name));
    }
    if let Some(product_name) = &request.product_name {
        let normalized = normalize_name(product_name);
        let product = repo
            .find_by_name(&normalized, false)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("AI product '{}' not found", normalized))
            })?;
        return Ok((product.ai_product_id, product.ai_product_name));
    }
    Ok((
        existing.ai_product_id.clone(),
        existing.product_name.clone(),
    ))
}

fn to_responses(items: Vec<EntitlementRuleEntity>) -> Vec<EntitlementRuleResponse> {
    items
        .into_iter()
        .map(|e| EntitlementRule::from(e).into())
        .collect()
}
