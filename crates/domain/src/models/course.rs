//! Course model and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::catalog::CatalogStatus;

/// A sellable course. Name is unique among non-deleted records.
#[derive(Debug, Clone)]
pub struct Course {
    pub course_id: String,
    pub course_name: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn status(&self) -> CatalogStatus {
        CatalogStatus::from_deleted_flag(self.is_deleted)
    }
}

/// Request to create a course.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 50, message = "course_name must be 1-50 characters"))]
    pub course_name: String,
}

/// Request to update a course. Renames cascade into denormalized
/// rule/entitlement name fields.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 50, message = "course_name must be 1-50 characters"))]
    pub course_name: Option<String>,
}

/// Lookup request accepting either an id or a name.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseLookupRequest {
    pub course_id: Option<String>,
    pub course_name: Option<String>,
}

/// Prefix search request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CourseSearchRequest {
    #[validate(length(min = 1, message = "course_name_prefix must not be empty"))]
    pub course_name_prefix: String,
}

/// Course as rendered to the admin UI.
#[derive(Debug, Clone, Serialize)]
pub struct CourseResponse {
    pub course_id: String,
    pub course_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        Self {
            course_id: course.course_id,
            course_name: course.course_name,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_rejects_empty_name() {
        let request = CreateCourseRequest {
            course_name: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_response_hides_deleted_flag() {
        let course = Course {
            course_id: "COURSE_1".into(),
            course_name: "Python Basics".into(),
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let response: CourseResponse = course.into();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["course_name"], "Python Basics");
        assert!(json.get("is_deleted").is_none());
    }

    #[test]
    fn test_status_derivation() {
        let mut course = Course {
            course_id: "COURSE_1".into(),
            course_name: "Python Basics".into(),
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(course.status(), CatalogStatus::Active);
        course.is_deleted = true;
        assert_eq!(course.status(), CatalogStatus::SoftDeleted);
    }
}
