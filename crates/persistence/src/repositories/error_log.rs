//! Error log repository for the upload and batch-generation audit tables.

use chrono::Utc;
use sqlx::PgPool;

use crate::entities::ErrorLogEntity;
use shared::pagination::Page;

/// Repository over the two append-only error log tables. Both tables have
/// the same shape; which one a method touches is explicit in its name.
#[derive(Clone)]
pub struct ErrorLogRepository {
    pool: PgPool,
}

impl ErrorLogRepository {
    /// Creates a new ErrorLogRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a bulk-upload row failure.
    pub async fn insert_upload_error(
        &self,
        order_id: &str,
        error_message: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO upload_error_orders (order_id, error_message, is_deleted, created_at)
            VALUES ($1, $2, false, $3)
            "#,
        )
        .bind(order_id)
        .bind(error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a batch-generation failure.
    pub async fn insert_batch_error(
        &self,
        order_id: &str,
        error_message: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO batch_generate_errors (order_id, error_message, is_deleted, created_at)
            VALUES ($1, $2, false, $3)
            "#,
        )
        .bind(order_id)
        .bind(error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List upload errors, newest first, with a total count.
    pub async fn list_upload_errors(
        &self,
        page: Page,
    ) -> Result<(Vec<ErrorLogEntity>, i64), sqlx::Error> {
        let items = sqlx::query_as::<_, ErrorLogEntity>(
            r#"
            SELECT id, order_id, error_message, is_deleted, created_at
            FROM upload_error_orders
            WHERE is_deleted = false
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM upload_error_orders WHERE is_deleted = false")
                .fetch_one(&self.pool)
                .await?;

        Ok((items, count.0))
    }

    /// List batch-generation errors, newest first, with a total count.
    pub async fn list_batch_errors(
        &self,
        page: Page,
    ) -> Result<(Vec<ErrorLogEntity>, i64), sqlx::Error> {
        let items = sqlx::query_as::<_, ErrorLogEntity>(
            r#"
            SELECT id, order_id, error_message, is_deleted, created_at
            FROM batch_generate_errors
            WHERE is_deleted = false
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM batch_generate_errors WHERE is_deleted = false")
                .fetch_one(&self.pool)
                .await?;

        Ok((items, count.0))
    }
}
