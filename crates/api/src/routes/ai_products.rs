//! AI product catalog endpoint handlers.
//!
//! Same lifecycle as courses: create-or-resurrect, rename with an atomic
//! denormalized-name cascade, soft and permanent deletes.

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
use domain::models::ai_product::{
    AiProductLookupRequest, AiProductResponse, AiProductSearchRequest, CreateAiProductRequest,
    UpdateAiProductRequest,
};
use domain::models::{AiProduct, CreateOutcome};
use persistence::repositories::{
    AiProductRepository, EntitlementRuleRepository, UserEntitlementRepository,
};
use shared::pagination::{PageParams, Paginated};
use shared::validation::normalize_name;

/// Response for a create that may have resurrected a soft-deleted product.
#[derive(Debug, Serialize)]
pub struct CreateAiProductResponse {
    pub ai_product: AiProductResponse,
    pub resurrected: bool,
}

/// Create a product, or resurrect a soft-deleted one holding the same name.
///
/// POST /api/v1/ai-products
pub async fn create_ai_product(
    State(state): State<AppState>,
    Json(request): Json<CreateAiProductRequest>,
) -> Result<(StatusCode, Json<CreateAiProductResponse>), ApiError> {
    request.validate()?;
    let product_name = normalize_name(&request.ai_product_name);
    if product_name.is_empty() {
        return Err(ApiError::Validation(
            "ai_product_name must not be empty".into(),
        ));
    }

    let repo = AiProductRepository::new(state.pool.clone());

    if repo.find_by_name(&product_name, false).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "AI product '{}' already exists",
            product_name
        )));
    }

    let outcome: CreateOutcome<AiProduct> =
        if let Some(deleted) = repo.find_by_name(&product_name, true).await? {
            let revived = repo
                .resurrect(&deleted.ai_product_id)
                .await?
                .ok_or_else(|| {
                    ApiError::Internal("Product resurrection raced a delete".into())
                })?;
            info!(ai_product_id = %revived.ai_product_id, name = %product_name, "AI product resurrected");
            CreateOutcome::Resurrected(revived.into())
        } else {
            let entity = repo
                .insert(&shared::ids::ai_product_id(), &product_name)
                .await?;
            info!(ai_product_id = %entity.ai_product_id, name = %product_name, "AI product created");
            CreateOutcome::Created(entity.into())
        };

    let status = if outcome.was_resurrected() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    let resurrected = outcome.was_resurrected();
    Ok((
        status,
        Json(CreateAiProductResponse {
            ai_product: outcome.into_inner().into(),
            resurrected,
        }),
    ))
}

/// List non-deleted products, paginated, newest first.
///
/// GET /api/v1/ai-products
pub async fn list_ai_products(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<AiProductResponse>>, ApiError> {
    let page = params.clamp();
    let repo = AiProductRepository::new(state.pool.clone());
    let (items, total) = repo.list(page).await?;

    let items = items
        .into_iter()
        .map(|e| AiProduct::from(e).into())
        .collect();
    Ok(Json(Paginated::new(items, total, page)))
}

/// Case-insensitive prefix search over product names.
///
/// GET /api/v1/ai-products/search?product_name_prefix=...
pub async fn search_ai_products(
    State(state): State<AppState>,
    Query(request): Query<AiProductSearchRequest>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<AiProductResponse>>, ApiError> {
    request.validate()?;
    let page = params.clamp();
    let repo = AiProductRepository::new(state.pool.clone());
    let (items, total) = repo
        .search_by_prefix(&request.product_name_prefix, page)
        .await?;

    let items = items
        .into_iter()
        .map(|e| AiProduct::from(e).into())
        .collect();
    Ok(Json(Paginated::new(items, total, page)))
}

/// Look a product up by id or by name.
///
/// POST /api/v1/ai-products/lookup
pub async fn lookup_ai_product(
    State(state): State<AppState>,
    Json(request): Json<AiProductLookupRequest>,
) -> Result<Json<AiProductResponse>, ApiError> {
    let repo = AiProductRepository::new(state.pool.clone());

    let entity = match (&request.ai_product_id, &request.ai_product_name) {
        (Some(ai_product_id), _) => repo.find_by_id(ai_product_id).await?,
        (None, Some(ai_product_name)) => {
            repo.find_by_name(&normalize_name(ai_product_name), false)
                .await?
        }
        (None, None) => {
            return Err(ApiError::Validation(
                "Provide ai_product_id or ai_product_name".into(),
            ))
        }
    };

    let entity = entity.ok_or_else(|| ApiError::NotFound("AI product not found".into()))?;
    Ok(Json(AiProduct::from(entity).into()))
}

/// Get a product by id.
///
/// GET /api/v1/ai-products/:ai_product_id
pub async fn get_ai_product(
    State(state): State<AppState>,
    Path(ai_product_id): Path<String>,
) -> Result<Json<AiProductResponse>, ApiError> {
    let repo = AiProductRepository::new(state.pool.clone());
    let entity = repo.find_by_id(&ai_product_id).await?.ok_or_else(|| {
        ApiError::NotFound(format!("AI product {} not found", ai_product_id))
    })?;
    Ok(Json(AiProduct::from(entity).into()))
}

/// Rename a product, cascading the new name into every entitlement rule and
/// user entitlement that denormalizes it.
///
/// PUT /api/v1/ai-products/:ai_product_id
pub async fn update_ai_product(
    State(state): State<AppState>,
    Path(ai_product_id): Path<String>,
    Json(request): Json<UpdateAiProductRequest>,
) -> Result<Json<AiProductResponse>, ApiError> {
    request.validate()?;
    let Some(new_name) = request.ai_product_name else {
        return Err(ApiError::Validation("No updatable fields provided".into()));
    };
    let new_name = normalize_name(&new_name);
    if new_name.is_empty() {
        return Err(ApiError::Validation(
            "ai_product_name must not be empty".into(),
        ));
    }

    let repo = AiProductRepository::new(state.pool.clone());
    repo.find_by_id(&ai_product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("AI product {} not found", ai_product_id)))?;

    if let Some(existing) = repo.find_by_name(&new_name, false).await? {
        if existing.ai_product_id != ai_product_id {
            return Err(ApiError::Conflict(format!(
                "AI product '{}' already exists",
                new_name
            )));
        }
    }

    let purge_id = repo
        .find_by_name(&new_name, true)
        .await?
        .map(|p| p.ai_product_id)
        .filter(|id| *id != ai_product_id);

    let mut tx = state.pool.begin().await?;
    if let Some(purge_id) = &purge_id {
        AiProductRepository::hard_delete_in_tx(&mut tx, purge_id).await?;
    }
    let entity = AiProductRepository::rename_in_tx(&mut tx, &ai_product_id, &new_name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("AI product {} not found", ai_product_id)))?;
    let rules_touched =
        EntitlementRuleRepository::update_product_name_in_tx(&mut tx, &ai_product_id, &new_name)
            .await?;
    let entitlements_touched =
        UserEntitlementRepository::update_product_name_in_tx(&mut tx, &ai_product_id, &new_name)
            .await?;
    tx.commit().await?;

    info!(
        ai_product_id = %ai_product_id,
        name = %new_name,
        rules = rules_touched,
        entitlements = entitlements_touched,
        "AI product renamed with name cascade"
    );
    Ok(Json(AiProduct::from(entity).into()))
}

/// Soft-delete a product.
///
/// DELETE /api/v1/ai-products/:ai_product_id
pub async fn delete_ai_product(
    State(state): State<AppState>,
    Path(ai_product_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = AiProductRepository::new(state.pool.clone());
    repo.find_by_id(&ai_product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("AI product {} not found", ai_product_id)))?;

    repo.soft_delete(&ai_product_id).await?;
    info!(ai_product_id = %ai_product_id, "AI product soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Permanently delete a product row.
///
/// DELETE /api/v1/ai-products/:ai_product_id/permanent
pub async fn delete_ai_product_permanently(
    State(state): State<AppState>,
    Path(ai_product_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = AiProductRepository::new(state.pool.clone());
    let deleted = repo.hard_delete(&ai_product_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!(
            "AI product {} not found",
            ai_product_id
        )));
    }
    info!(ai_product_id = %ai_product_id, "AI product permanently deleted");
    Ok(StatusCode::NO_CONTENT)
}
