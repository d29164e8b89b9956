//! Order repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::entities::OrderEntity;
use shared::pagination::Page;

const ORDER_COLUMNS: &str =
    "order_id, phone, course_id, purchase_time, is_refund, is_generate, is_deleted, created_at";

/// Input for inserting a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub phone: String,
    pub course_id: String,
    pub purchase_time: DateTime<Utc>,
    pub is_refund: bool,
}

/// Partial update of an order's mutable fields. `None` leaves a field as-is.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub phone: Option<String>,
    pub course_id: Option<String>,
    pub purchase_time: Option<DateTime<Utc>>,
    pub is_refund: Option<bool>,
    pub is_generate: Option<bool>,
}

/// Resolved filter for order queries (names already mapped to ids).
#[derive(Debug, Clone, Default)]
pub struct OrderRowFilter {
    pub phone: Option<String>,
    pub course_id: Option<String>,
    pub purchase_time: Option<DateTime<Utc>>,
    pub is_refund: Option<bool>,
}

/// Repository for order-related database operations.
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Creates a new OrderRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an order by its ID, regardless of soft-delete state.
    pub async fn find_by_id(&self, order_id: &str) -> Result<Option<OrderEntity>, sqlx::Error> {
        sqlx::query_as::<_, OrderEntity>(&format!(
            "SELECT {} FROM orders WHERE order_id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert a new order. `is_generate` always starts false.
    pub async fn insert(&self, order: &NewOrder) -> Result<OrderEntity, sqlx::Error> {
        sqlx::query_as::<_, OrderEntity>(&format!(
            r#"
            INSERT INTO orders
                (order_id, phone, course_id, purchase_time, is_refund, is_generate, is_deleted, created_at)
            VALUES ($1, $2, $3, $4, $5, false, false, $6)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(&order.order_id)
        .bind(&order.phone)
        .bind(&order.course_id)
        .bind(order.purchase_time)
        .bind(order.is_refund)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    /// Apply a partial field update. Absent fields keep their stored value.
    pub async fn update_fields(
        &self,
        order_id: &str,
        update: &OrderUpdate,
    ) -> Result<Option<OrderEntity>, sqlx::Error> {
        sqlx::query_as::<_, OrderEntity>(&format!(
            r#"
            UPDATE orders
            SET phone = COALESCE($2, phone),
                course_id = COALESCE($3, course_id),
                purchase_time = COALESCE($4, purchase_time),
                is_refund = COALESCE($5, is_refund),
                is_generate = COALESCE($6, is_generate)
            WHERE order_id = $1
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(&update.phone)
        .bind(&update.course_id)
        .bind(update.purchase_time)
        .bind(update.is_refund)
        .bind(update.is_generate)
        .fetch_optional(&self.pool)
        .await
    }

    /// Flip the generation flag inside a caller-owned transaction. Committed
    /// together with the entitlement write it mirrors.
    pub async fn set_generate_in_tx(
        conn: &mut PgConnection,
        order_id: &str,
        is_generate: bool,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE orders SET is_generate = $2 WHERE order_id = $1")
            .bind(order_id)
            .bind(is_generate)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Flip the generation flag outside any transaction. Used by the
    /// self-heal path when no entitlement exists to retire.
    pub async fn set_generate(
        &self,
        order_id: &str,
        is_generate: bool,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE orders SET is_generate = $2 WHERE order_id = $1")
            .bind(order_id)
            .bind(is_generate)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Mark the order as refunded. Used by the bulk importer's
    /// refund-transition path.
    pub async fn mark_refunded(&self, order_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE orders SET is_refund = true WHERE order_id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Soft-delete an order. Returns the number of rows affected.
    pub async fn soft_delete(&self, order_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orders SET is_deleted = true WHERE order_id = $1 AND is_deleted = false",
        )
        .bind(order_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// List non-deleted orders, newest first, with a total count.
    pub async fn list(&self, page: Page) -> Result<(Vec<OrderEntity>, i64), sqlx::Error> {
        let items = sqlx::query_as::<_, OrderEntity>(&format!(
            r#"
            SELECT {} FROM orders
            WHERE is_deleted = false
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
            ORDER_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.count_active().await?;
        Ok((items, total))
    }

    /// Filtered order listing over non-deleted rows.
    pub async fn find_by_filter(
        &self,
        filter: &OrderRowFilter,
        page: Page,
    ) -> Result<(Vec<OrderEntity>, i64), sqlx::Error> {
        let where_clause = r#"
            WHERE is_deleted = false
              AND ($1::text IS NULL OR phone = $1)
              AND ($2::text IS NULL OR course_id = $2)
              AND ($3::timestamptz IS NULL OR purchase_time = $3)
              AND ($4::bool IS NULL OR is_refund = $4)
        "#;

        let items = sqlx::query_as::<_, OrderEntity>(&format!(
            "SELECT {} FROM orders {} ORDER BY created_at DESC LIMIT $5 OFFSET $6",
            ORDER_COLUMNS, where_clause
        ))
        .bind(&filter.phone)
        .bind(&filter.course_id)
        .bind(filter.purchase_time)
        .bind(filter.is_refund)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM orders {}", where_clause))
                .bind(&filter.phone)
                .bind(&filter.course_id)
                .bind(filter.purchase_time)
                .bind(filter.is_refund)
                .fetch_one(&self.pool)
                .await?;

        Ok((items, count.0))
    }

    /// Non-deleted orders created in `[from, to)`. Swept by the nightly sync.
    pub async fn find_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OrderEntity>, sqlx::Error> {
        sqlx::query_as::<_, OrderEntity>(&format!(
            r#"
            SELECT {} FROM orders
            WHERE is_deleted = false AND created_at >= $1 AND created_at < $2
            ORDER BY created_at ASC
            "#,
            ORDER_COLUMNS
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
    }

    /// Workset (a) for batch generation: ungenerated, unrefunded orders.
    pub async fn find_generation_candidates(&self) -> Result<Vec<OrderEntity>, sqlx::Error> {
        sqlx::query_as::<_, OrderEntity>(&format!(
            r#"
            SELECT {} FROM orders
            WHERE is_deleted = false AND is_generate = false AND is_refund = false
            ORDER BY created_at ASC
            "#,
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Workset (b) for batch generation: refunded orders whose entitlement
    /// still exists.
    pub async fn find_retirement_candidates(&self) -> Result<Vec<OrderEntity>, sqlx::Error> {
        sqlx::query_as::<_, OrderEntity>(&format!(
            r#"
            SELECT {} FROM orders
            WHERE is_deleted = false AND is_generate = true AND is_refund = true
            ORDER BY created_at ASC
            "#,
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Count non-deleted orders.
    pub async fn count_active(&self) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE is_deleted = false")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
