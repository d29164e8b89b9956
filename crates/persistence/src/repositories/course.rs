//! Course repository for database operations.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};

use crate::entities::CourseEntity;
use shared::pagination::Page;

/// Repository for course-related database operations.
#[derive(Clone)]
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    /// Creates a new CourseRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a course by its ID, regardless of soft-delete state.
    pub async fn find_by_id(&self, course_id: &str) -> Result<Option<CourseEntity>, sqlx::Error> {
        sqlx::query_as::<_, CourseEntity>(
            r#"
            SELECT course_id, course_name, is_deleted, created_at, updated_at
            FROM courses
            WHERE course_id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a course by exact name and soft-delete state.
    pub async fn find_by_name(
        &self,
        course_name: &str,
        is_deleted: bool,
    ) -> Result<Option<CourseEntity>, sqlx::Error> {
        sqlx::query_as::<_, CourseEntity>(
            r#"
            SELECT course_id, course_name, is_deleted, created_at, updated_at
            FROM courses
            WHERE course_name = $1 AND is_deleted = $2
            "#,
        )
        .bind(course_name)
        .bind(is_deleted)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert a new course.
    pub async fn insert(
        &self,
        course_id: &str,
        course_name: &str,
    ) -> Result<CourseEntity, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, CourseEntity>(
            r#"
            INSERT INTO courses (course_id, course_name, is_deleted, created_at, updated_at)
            VALUES ($1, $2, false, $3, $3)
            RETURNING course_id, course_name, is_deleted, created_at, updated_at
            "#,
        )
        .bind(course_id)
        .bind(course_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    /// Bring a soft-deleted course back to life.
    pub async fn resurrect(&self, course_id: &str) -> Result<Option<CourseEntity>, sqlx::Error> {
        sqlx::query_as::<_, CourseEntity>(
            r#"
            UPDATE courses
            SET is_deleted = false, updated_at = $2
            WHERE course_id = $1 AND is_deleted = true
            RETURNING course_id, course_name, is_deleted, created_at, updated_at
            "#,
        )
        .bind(course_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
    }

    /// Rename a course inside a caller-owned transaction. The rename is
    /// committed together with the denormalized-name cascade.
    pub async fn rename_in_tx(
        conn: &mut PgConnection,
        course_id: &str,
        course_name: &str,
    ) -> Result<Option<CourseEntity>, sqlx::Error> {
        sqlx::query_as::<_, CourseEntity>(
            r#"
            UPDATE courses
            SET course_name = $2, updated_at = $3
            WHERE course_id = $1
            RETURNING course_id, course_name, is_deleted, created_at, updated_at
            "#,
        )
        .bind(course_id)
        .bind(course_name)
        .bind(Utc::now())
        .fetch_optional(conn)
        .await
    }

    /// Soft-delete a course. Returns the number of rows affected.
    pub async fn soft_delete(&self, course_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET is_deleted = true, updated_at = $2
            WHERE course_id = $1 AND is_deleted = false
            "#,
        )
        .bind(course_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Permanently delete a course row.
    pub async fn hard_delete(&self, course_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM courses WHERE course_id = $1")
            .bind(course_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Permanently delete a course row inside a caller-owned transaction.
    /// Used by rename to free a name held by a soft-deleted record.
    pub async fn hard_delete_in_tx(
        conn: &mut PgConnection,
        course_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM courses WHERE course_id = $1")
            .bind(course_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// List non-deleted courses, newest first, with a total count.
    pub async fn list(&self, page: Page) -> Result<(Vec<CourseEntity>, i64), sqlx::Error> {
        let items = sqlx::query_as::<_, CourseEntity>(
            r#"
            SELECT course_id, course_name, is_deleted, created_at, updated_at
            FROM courses
            WHERE is_deleted = false
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.count_active().await?;
        Ok((items, total))
    }

    /// Case-insensitive name-prefix search over non-deleted courses.
    pub async fn search_by_prefix(
        &self,
        prefix: &str,
        page: Page,
    ) -> Result<(Vec<CourseEntity>, i64), sqlx::Error> {
        // Escape LIKE wildcards so a literal % in the prefix stays literal.
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("{}%", escaped);

        let items = sqlx::query_as::<_, CourseEntity>(
            r#"
            SELECT course_id, course_name, is_deleted, created_at, updated_at
            FROM courses
            WHERE is_deleted = false AND course_name ILIKE $1
            ORDER BY course_name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM courses
            WHERE is_deleted = false AND course_name ILIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, count.0))
    }

    /// Count non-deleted courses.
    pub async fn count_active(&self) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM courses WHERE is_deleted = false")
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }
}
