//! Course catalog endpoint handlers.
//!
//! Courses are soft-deletable named entities. Two behaviors here are easy
//! to miss: creating a name held by a soft-deleted course resurrects that
//! course instead of inserting, and renaming a course cascades the new name
//! into every rule and entitlement that denormalizes it — atomically, in
//! the same transaction as the rename.

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
use domain::models::course::{
    CourseLookupRequest, CourseResponse, CourseSearchRequest, CreateCourseRequest,
    UpdateCourseRequest,
};
use domain::models::{Course, CreateOutcome};
use persistence::repositories::{
    CourseRepository, EntitlementRuleRepository, UserEntitlementRepository,
};
use shared::pagination::{PageParams, Paginated};
use shared::validation::normalize_name;

/// Response for a create that may have resurrected a soft-deleted course.
#[derive(Debug, Serialize)]
pub struct CreateCourseResponse {
    pub course: CourseResponse,
    pub resurrected: bool,
}

/// Create a course, or resurrect a soft-deleted one holding the same name.
///
/// POST /api/v1/courses
pub async fn create_course(
    State(state): State<AppState>,
    Json(request): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CreateCourseResponse>), ApiError> {
    request.validate()?;
    let course_name = normalize_name(&request.course_name);
    if course_name.is_empty() {
        return Err(ApiError::Validation("course_name must not be empty".into()));
    }

    let repo = CourseRepository::new(state.pool.clone());

    if repo.find_by_name(&course_name, false).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Course '{}' already exists",
            course_name
        )));
    }

    // A soft-deleted record holding the name comes back instead of a new
    // row being inserted.
    let outcome: CreateOutcome<Course> =
        if let Some(deleted) = repo.find_by_name(&course_name, true).await? {
            let revived = repo
                .resurrect(&deleted.course_id)
                .await?
                .ok_or_else(|| ApiError::Internal("Course resurrection raced a delete".into()))?;
            info!(course_id = %revived.course_id, name = %course_name, "Course resurrected");
            CreateOutcome::Resurrected(revived.into())
        } else {
            let entity = repo.insert(&shared::ids::course_id(), &course_name).await?;
            info!(course_id = %entity.course_id, name = %course_name, "Course created");
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
        Json(CreateCourseResponse {
            course: outcome.into_inner().into(),
            resurrected,
        }),
    ))
}

/// List non-deleted courses, paginated, newest first.
///
/// GET /api/v1/courses
pub async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<CourseResponse>>, ApiError> {
    let page = params.clamp();
    let repo = CourseRepository::new(state.pool.clone());
    let (items, total) = repo.list(page).await?;

    let items = items
        .into_iter()
        .map(|e| Course::from(e).into())
        .collect();
    Ok(Json(Paginated::new(items, total, page)))
}

/// Case-insensitive prefix search over course names.
///
/// GET /api/v1/courses/search?course_name_prefix=...
pub async fn search_courses(
    State(state): State<AppState>,
    Query(request): Query<CourseSearchRequest>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<CourseResponse>>, ApiError> {
    request.validate()?;
    let page = params.clamp();
    let repo = CourseRepository::new(state.pool.clone());
    let (items, total) = repo
        .search_by_prefix(&request.course_name_prefix, page)
        .await?;

    let items = items
        .into_iter()
        .map(|e| Course::from(e).into())
        .collect();
    Ok(Json(Paginated::new(items, total, page)))
}

/// Look a course up by id or by name.
///
/// POST /api/v1/courses/lookup
pub async fn lookup_course(
    State(state): State<AppState>,
    Json(request): Json<CourseLookupRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    let repo = CourseRepository::new(state.pool.clone());

    let entity = match (&request.course_id, &request.course_name) {
        (Some(course_id), _) => repo.find_by_id(course_id).await?,
        (None, Some(course_name)) => {
            repo.find_by_name(&normalize_name(course_name), false).await?
        }
        (None, None) => {
            return Err(ApiError::Validation(
                "Provide course_id or course_name".into(),
            ))
        }
    };

    let entity =
        entity.ok_or_else(|| ApiError::NotFound("Course not found".into()))?;
    Ok(Json(Course::from(entity).into()))
}

/// Get a course by id.
///
/// GET /api/v1/courses/:course_id
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    let repo = CourseRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(&course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Course {} not found", course_id)))?;
    Ok(Json(Course::from(entity).into()))
}

/// Rename a course, cascading the new name into every entitlement rule and
/// user entitlement that denormalizes it.
///
/// PUT /api/v1/courses/:course_id
pub async fn update_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(request): Json<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    request.validate()?;
    let Some(new_name) = request.course_name else {
        return Err(ApiError::Validation("No updatable fields provided".into()));
    };
    let new_name = normalize_name(&new_name);
    if new_name.is_empty() {
        return Err(ApiError::Validation("course_name must not be empty".into()));
    }

    let repo = CourseRepository::new(state.pool.clone());
    repo.find_by_id(&course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Course {} not found", course_id)))?;

    // The name must not collide with a different live course.
    if let Some(existing) = repo.find_by_name(&new_name, false).await? {
        if existing.course_id != course_id {
            return Err(ApiError::Conflict(format!(
                "Course '{}' already exists",
                new_name
            )));
        }
    }

    // A soft-deleted holder of the name is purged to free it.
    let purge_id = repo
        .find_by_name(&new_name, true)
        .await?
        .map(|c| c.course_id)
        .filter(|id| *id != course_id);

    // Rename + cascade commit or roll back together.
    let mut tx = state.pool.begin().await?;
    if let Some(purge_id) = &purge_id {
        CourseRepository::hard_delete_in_tx(&mut tx, purge_id).await?;
    }
    let entity = CourseRepository::rename_in_tx(&mut tx, &course_id, &new_name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Course {} not found", course_id)))?;
    let rules_touched =
        EntitlementRuleRepository::update_course_name_in_tx(&mut tx, &course_id, &new_name)
            .await?;
    let entitlements_touched =
        UserEntitlementRepository::update_course_name_in_tx(&mut tx, &course_id, &new_name)
            .await?;
    tx.commit().await?;

    info!(
        course_id = %course_id,
        name = %new_name,
        rules = rules_touched,
        entitlements = entitlements_touched,
        "Course renamed with name cascade"
    );
    Ok(Json(Course::from(entity).into()))
}

/// Soft-delete a course.
///
/// DELETE /api/v1/courses/:course_id
pub async fn delete_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = CourseRepository::new(state.pool.clone());
    repo.find_by_id(&course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Course {} not found", course_id)))?;

    repo.soft_delete(&course_id).await?;
    info!(course_id = %course_id, "Course soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Permanently delete a course row.
///
/// DELETE /api/v1/courses/:course_id/permanent
pub async fn delete_course_permanently(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = CourseRepository::new(state.pool.clone());
    let deleted = repo.hard_delete(&course_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!(
            "Course {} not found",
            course_id
        )));
    }
    info!(course_id = %course_id, "Course permanently deleted");
    Ok(StatusCode::NO_CONTENT)
}
