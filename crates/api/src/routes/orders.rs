//! Order endpoint handlers.
//!
//! Orders keep the course reference by id; course names in requests are
//! resolved on the way in and never stored. A refunded order can never be
//! created as refunded — refund is a transition applied afterwards, either
//! via update or through the bulk importer's refund-transition path.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::order::{
    CreateOrderRequest, OrderFilter, OrderResponse, UpdateOrderRequest,
};
use domain::models::{Order, RefundMarker};
use persistence::entities::OrderEntity;
use persistence::repositories::{
    CourseRepository, NewOrder, OrderRepository, OrderRowFilter, OrderUpdate,
};
use shared::pagination::{PageParams, Paginated};
use shared::validation::{normalize_name, parse_purchase_time};

/// Create an order.
///
/// POST /api/v1/orders
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    request.validate()?;

    let marker = RefundMarker::parse(&request.is_refund).map_err(ApiError::from)?;
    if marker.is_refund() {
        return Err(ApiError::Conflict(
            "A refunded order cannot be created".into(),
        ));
    }

    let purchase_time = parse_purchase_time(&request.purchase_time)
        .map_err(|e| ApiError::Validation(e.message.unwrap_or_default().to_string()))?;

    let course_name = normalize_name(&request.course_name);
    let course_repo = CourseRepository::new(state.pool.clone());
    let course = course_repo
        .find_by_name(&course_name, false)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Course '{}' not found", course_name)))?;

    let order_repo = OrderRepository::new(state.pool.clone());
    if order_repo.find_by_id(&request.order_id).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Order {} already exists",
            request.order_id
        )));
    }

    let entity = order_repo
        .insert(&NewOrder {
            order_id: request.order_id.clone(),
            phone: request.phone.clone(),
            course_id: course.course_id.clone(),
            purchase_time,
            is_refund: false,
        })
        .await?;

    info!(order_id = %entity.order_id, phone = %entity.phone, "Order created");
    Ok((StatusCode::CREATED, Json(Order::from(entity).into())))
}

/// List non-deleted orders, paginated, newest first.
///
/// GET /api/v1/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<OrderResponse>>, ApiError> {
    let page = params.clamp();
    let repo = OrderRepository::new(state.pool.clone());
    let (items, total) = repo.list(page).await?;

    Ok(Json(Paginated::new(to_responses(items), total, page)))
}

/// Filtered order listing. Course names and refund markers in the filter
/// are resolved to their stored forms before querying.
///
/// POST /api/v1/orders/filter
pub async fn filter_orders(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    Json(filter): Json<OrderFilter>,
) -> Result<Json<Paginated<OrderResponse>>, ApiError> {
    let page = params.clamp();

    let course_id = match &filter.course_name {
        Some(course_name) => {
            let normalized = normalize_name(course_name);
            let course_repo = CourseRepository::new(state.pool.clone());
            let course = course_repo
                .find_by_name(&normalized, false)
                .await?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Course '{}' not found", normalized))
                })?;
            Some(course.course_id)
        }
        None => None,
    };

    let purchase_time = filter
        .purchase_time
        .as_deref()
        .map(parse_purchase_time)
        .transpose()
        .map_err(|e| ApiError::Validation(e.message.unwrap_or_default().to_string()))?;

    let is_refund = filter
        .is_refund
        .as_deref()
        .map(RefundMarker::parse)
        .transpose()
        .map_err(ApiError::from)?
        .map(|m| m.is_refund());

    let row_filter = OrderRowFilter {
        phone: filter.phone.clone(),
        course_id,
        purchase_time,
        is_refund,
    };

    let repo = OrderRepository::new(state.pool.clone());
    let (items, total) = repo.find_by_filter(&row_filter, page).await?;

    Ok(Json(Paginated::new(to_responses(items), total, page)))
}

/// Get an order by id.
///
/// GET /api/v1/orders/:order_id
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let repo = OrderRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(&order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {} not found", order_id)))?;
    Ok(Json(Order::from(entity).into()))
}

/// Update an order's allow-listed mutable fields.
///
/// PUT /api/v1/orders/:order_id
pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::Validation("No updatable fields provided".into()));
    }

    let is_refund = request
        .is_refund
        .as_deref()
        .map(RefundMarker::parse)
        .transpose()
        .map_err(ApiError::from)?
        .map(|m| m.is_refund());

    let purchase_time = request
        .purchase_time
        .as_deref()
        .map(parse_purchase_time)
        .transpose()
        .map_err(|e| ApiError::Validation(e.message.unwrap_or_default().to_string()))?;

    let repo = OrderRepository::new(state.pool.clone());
    repo.find_by_id(&order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {} not found", order_id)))?;

    // course_name resolves to course_id; the name itself is not stored.
    let course_id = match &request.course_name {
        Some(course_name) => {
            let normalized = normalize_name(course_name);
            let course_repo = CourseRepository::new(state.pool.clone());
            let course = course_repo
                .find_by_name(&normalized, false)
                .await?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Course '{}' not found", normalized))
                })?;
            Some(course.course_id)
        }
        None => None,
    };

    let entity = repo
        .update_fields(
            &order_id,
            &OrderUpdate {
                phone: request.phone.clone(),
                course_id,
                purchase_time,
                is_refund,
                is_generate: request.is_generate,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {} not found", order_id)))?;

    info!(order_id = %order_id, "Order updated");
    Ok(Json(Order::from(entity).into()))
}

/// Soft-delete an order.
///
/// DELETE /api/v1/orders/:order_id
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = OrderRepository::new(state.pool.clone());
    repo.find_by_id(&order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {} not found", order_id)))?;

    repo.soft_delete(&order_id).await?;
    info!(order_id = %order_id, "Order soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn to_responses(items: Vec<OrderEntity>) -> Vec<OrderResponse> {
    items.into_iter().map(|e| Order::from(e).into()).collect()
}
