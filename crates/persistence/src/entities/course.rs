//! Course entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::Course;

/// Database row mapping for the courses table.
#[derive(Debug, Clone, FromRow)]
pub struct CourseEntity {
    pub course_id: String,
    pub course_name: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CourseEntity> for Course {
    fn from(entity: CourseEntity) -> Self {
        Self {
            course_id: entity.course_id,
            course_name: entity.course_name,
            is_deleted: entity.is_deleted,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::CatalogStatus;

    #[test]
    fn test_entity_to_domain_conversion() {
        let entity = CourseEntity {
            course_id: "COURSE_abc".into(),
            course_name: "Python Basics".into(),
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let course: Course = entity.into();
        assert_eq!(course.course_id, "COURSE_abc");
        assert_eq!(course.status(), CatalogStatus::Active);
    }
}
