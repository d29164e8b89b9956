//! AI product repository for database operations.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};

use crate::entities::AiProductEntity;
use shared::pagination::Page;

/// Repository for AI-product-related database operations.
#[derive(Clone)]
pub struct AiProductRepository {
    pool: PgPool,
}

impl AiProductRepository {
    /// Creates a new AiProductRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a product by its ID, regardless of soft-delete state.
    pub async fn find_by_id(
        &self,
        ai_product_id: &str,
    ) -> Result<Option<AiProductEntity>, sqlx::Error> {
        sqlx::query_as::<_, AiProductEntity>(
            r#"
            SELECT ai_product_id, ai_product_name, is_deleted, created_at, updated_at
            FROM ai_products
            WHERE ai_product_id = $1
            "#,
        )
        .bind(ai_product_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a product by exact name and soft-delete state.
    pub async fn find_by_name(
        &self,
        ai_product_name: &str,
        is_deleted: bool,
    ) -> Result<Option<AiProductEntity>, sqlx::Error> {
        sqlx::query_as::<_, AiProductEntity>(
            r#"
            SELECT ai_product_id, ai_product_name, is_deleted, created_at, updated_at
            FROM ai_products
            WHERE ai_product_name = $1 AND is_deleted = $2
            "#,
        )
        .bind(ai_product_name)
        .bind(is_deleted)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert a new product.
    pub async fn insert(
        &self,
        ai_product_id: &str,
        ai_product_name: &str,
    ) -> Result<AiProductEntity, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, AiProductEntity>(
            r#"
            INSERT INTO ai_products (ai_product_id, ai_product_name, is_deleted, created_at, updated_at)
            VALUES ($1, $2, false, $3, $3)
            RETURNING ai_product_id, ai_product_name, is_deleted, created_at, updated_at
            "#,
        )
        .bind(ai_product_id)
        .bind(ai_product_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    /// Bring a soft-deleted product back to life.
    pub async fn resurrect(
        &self,
        ai_product_id: &str,
    ) -> Result<Option<AiProductEntity>, sqlx::Error> {
        sqlx::query_as::<_, AiProductEntity>(
            r#"
            UPDATE ai_products
            SET is_deleted = false, updated_at = $2
            WHERE ai_product_id = $1 AND is_deleted = true
            RETURNING ai_product_id, ai_product_name, is_deleted, created_at, updated_at
            "#,
        )
        .bind(ai_product_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
    }

    /// Rename a product inside a caller-owned transaction.
    pub async fn rename_in_tx(
        conn: &mut PgConnection,
        ai_product_id: &str,
        ai_product_name: &str,
    ) -> Result<Option<AiProductEntity>, sqlx::Error> {
        sqlx::query_as::<_, AiProductEntity>(
            r#"
            UPDATE ai_products
            SET ai_product_name = $2, updated_at = $3
            WHERE ai_product_id = $1
            RETURNING ai_product_id, ai_product_name, is_deleted, created_at, updated_at
            "#,
        )
        .bind(ai_product_id)
        .bind(ai_product_name)
        .bind(Utc::now())
        .fetch_optional(conn)
        .await
    }

    /// Soft-delete a product. Returns the number of rows affected.
    pub async fn soft_delete(&self, ai_product_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE ai_products
            SET is_deleted = true, updated_at = $2
            WHERE ai_product_id = $1 AND is_deleted = false
            "#,
        )
        .bind(ai_product_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Permanently delete a product row.
    pub async fn hard_delete(&self, ai_product_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ai_products WHERE ai_product_id = $1")
            .bind(ai_product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Permanently delete a product row inside a caller-owned transaction.
    pub async fn hard_delete_in_tx(
        conn: &mut PgConnection,
        ai_product_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ai_products WHERE ai_product_id = $1")
            .bind(ai_product_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// List non-deleted products, newest first, with a total count.
    pub async fn list(&self, page: Page) -> Result<(Vec<AiProductEntity>, i64), sqlx::Error> {
        let items = sqlx::query_as::<_, AiProductEntity>(
            r#"
            SELECT ai_product_id, ai_product_name, is_deleted, created_at, updated_at
            FROM ai_products
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

    /// Case-insensitive name-prefix search over non-deleted products.
    pub async fn search_by_prefix(
        &self,
        prefix: &str,
        page: Page,
    ) -> Result<(Vec<AiProductEntity>, i64), sqlx::Error> {
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("{}%", escaped);

        let items = sqlx::query_as::<_, AiProductEntity>(
            r#"
            SELECT ai_product_id, ai_product_name, is_deleted, created_at, updated_at
            FROM ai_products
            WHERE is_deleted = false AND ai_product_name ILIKE $1
            ORDER BY ai_product_name ASC
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
            SELECT COUNT(*) FROM ai_products
            WHERE is_deleted = false AND ai_product_name ILIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, count.0))
    }

    /// Count non-deleted products.
    pub async fn count_active(&self) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM ai_products WHERE is_deleted = false")
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }
}
