//! User entitlement repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::entities::UserEntitlementEntity;
use shared::pagination::Page;

const ENTITLEMENT_COLUMNS: &str = "entitlement_id, phone, order_id, rule_id, course_name, \
     product_name, ai_product_id, start_date, end_date, is_active, daily_remaining, \
     is_deleted, created_at";

/// Input for inserting a new entitlement.
#[derive(Debug, Clone)]
pub struct NewUserEntitlement {
    pub entitlement_id: String,
    pub phone: String,
    pub order_id: Option<String>,
    pub rule_id: String,
    pub course_name: String,
    pub product_name: String,
    pub ai_product_id: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub daily_remaining: i32,
}

/// Partial update of an entitlement's mutable fields.
#[derive(Debug, Clone, Default)]
pub struct EntitlementUpdate {
    pub phone: Option<String>,
    pub rule_id: Option<String>,
    pub product_name: Option<String>,
    pub ai_product_id: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
    pub daily_remaining: Option<i32>,
    pub is_active: Option<bool>,
    pub order_id: Option<String>,
}

/// Filter for entitlement queries.
#[derive(Debug, Clone, Default)]
pub struct EntitlementRowFilter {
    pub entitlement_id: Option<String>,
    pub phone: Option<String>,
    pub order_id: Option<String>,
    pub rule_id: Option<String>,
    pub course_name: Option<String>,
    pub product_name: Option<String>,
    pub is_active: Option<bool>,
}

/// Repository for user-entitlement database operations.
#[derive(Clone)]
pub struct UserEntitlementRepository {
    pool: PgPool,
}

impl UserEntitlementRepository {
    /// Creates a new UserEntitlementRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an entitlement by its ID, regardless of soft-delete state.
    pub async fn find_by_id(
        &self,
        entitlement_id: &str,
    ) -> Result<Option<UserEntitlementEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntitlementEntity>(&format!(
            "SELECT {} FROM user_entitlements WHERE entitlement_id = $1",
            ENTITLEMENT_COLUMNS
        ))
        .bind(entitlement_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find the non-deleted entitlement derived from an order, if any.
    pub async fn find_active_by_order(
        &self,
        order_id: &str,
    ) -> Result<Option<UserEntitlementEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntitlementEntity>(&format!(
            r#"
            SELECT {} FROM user_entitlements
            WHERE order_id = $1 AND is_deleted = false
            "#,
            ENTITLEMENT_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a non-deleted entitlement for a (phone, rule) pair, if any.
    /// The dedup precondition shared by every creation path.
    pub async fn find_active_by_phone_and_rule(
        &self,
        phone: &str,
        rule_id: &str,
    ) -> Result<Option<UserEntitlementEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntitlementEntity>(&format!(
            r#"
            SELECT {} FROM user_entitlements
            WHERE phone = $1 AND rule_id = $2 AND is_deleted = false
            LIMIT 1
            "#,
            ENTITLEMENT_COLUMNS
        ))
        .bind(phone)
        .bind(rule_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert an entitlement through the pool. Used by creation paths that
    /// make no paired order write.
    pub async fn insert(
        &self,
        entitlement: &NewUserEntitlement,
    ) -> Result<UserEntitlementEntity, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_in_tx(&mut conn, entitlement).await
    }

    /// Insert an entitlement on a caller-owned connection. The per-order
    /// generation path runs this inside the same transaction that flips the
    /// order's generation flag.
    pub async fn insert_in_tx(
        conn: &mut PgConnection,
        entitlement: &NewUserEntitlement,
    ) -> Result<UserEntitlementEntity, sqlx::Error> {
        sqlx::query_as::<_, UserEntitlementEntity>(&format!(
            r#"
            INSERT INTO user_entitlements
                (entitlement_id, phone, order_id, rule_id, course_name, product_name,
                 ai_product_id, start_date, end_date, is_active, daily_remaining,
                 is_deleted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, false, $12)
            RETURNING {}
            "#,
            ENTITLEMENT_COLUMNS
        ))
        .bind(&entitlement.entitlement_id)
        .bind(&entitlement.phone)
        .bind(&entitlement.order_id)
        .bind(&entitlement.rule_id)
        .bind(&entitlement.course_name)
        .bind(&entitlement.product_name)
        .bind(&entitlement.ai_product_id)
        .bind(entitlement.start_date)
        .bind(entitlement.end_date)
        .bind(entitlement.is_active)
        .bind(entitlement.daily_remaining)
        .bind(Utc::now())
        .fetch_one(conn)
        .await
    }

    /// Retire an entitlement: inactive and soft-deleted in one write. Runs
    /// inside the transaction that clears the order's generation flag.
    pub async fn retire_in_tx(
        conn: &mut PgConnection,
        entitlement_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE user_entitlements
            SET is_active = false, is_deleted = true
            WHERE entitlement_id = $1 AND is_deleted = false
            "#,
        )
        .bind(entitlement_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Apply a partial field update. Absent fields keep their stored value.
    pub async fn update_fields(
        &self,
        entitlement_id: &str,
        update: &EntitlementUpdate,
    ) -> Result<Option<UserEntitlementEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntitlementEntity>(&format!(
            r#"
            UPDATE user_entitlements
            SET phone = COALESCE($2, phone),
                rule_id = COALESCE($3, rule_id),
                product_name = COALESCE($4, product_name),
                ai_product_id = COALESCE($5, ai_product_id),
                end_date = COALESCE($6, end_date),
                daily_remaining = COALESCE($7, daily_remaining),
                is_active = COALESCE($8, is_active),
                order_id = COALESCE($9, order_id)
            WHERE entitlement_id = $1
            RETURNING {}
            "#,
            ENTITLEMENT_COLUMNS
        ))
        .bind(entitlement_id)
        .bind(&update.phone)
        .bind(&update.rule_id)
        .bind(&update.product_name)
        .bind(&update.ai_product_id)
        .bind(update.end_date)
        .bind(update.daily_remaining)
        .bind(update.is_active)
        .bind(&update.order_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Soft-delete an entitlement. Returns the number of rows affected.
    pub async fn soft_delete(&self, entitlement_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE user_entitlements
            SET is_deleted = true
            WHERE entitlement_id = $1 AND is_deleted = false
            "#,
        )
        .bind(entitlement_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// List non-deleted entitlements, newest first, with a total count.
    pub async fn list(
        &self,
        page: Page,
    ) -> Result<(Vec<UserEntitlementEntity>, i64), sqlx::Error> {
        let items = sqlx::query_as::<_, UserEntitlementEntity>(&format!(
            r#"
            SELECT {} FROM user_entitlements
            WHERE is_deleted = false
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
            ENTITLEMENT_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.count_active().await?;
        Ok((items, total))
    }

    /// Filtered entitlement listing over non-deleted rows.
    pub async fn find_by_filter(
        &self,
        filter: &EntitlementRowFilter,
        page: Page,
    ) -> Result<(Vec<UserEntitlementEntity>, i64), sqlx::Error> {
        let where_clause = r#"
            WHERE is_deleted = false
              AND ($1::text IS NULL OR entitlement_id = $1)
              AND ($2::text IS NULL OR phone = $2)
              AND ($3::text IS NULL OR order_id = $3)
              AND ($4::text IS NULL OR rule_id = $4)
              AND ($5::text IS NULL OR course_name = $5)
              AND ($6::text IS NULL OR product_name = $6)
              AND ($7::bool IS NULL OR is_active = $7)
        "#;

        let items = sqlx::query_as::<_, UserEntitlementEntity>(&format!(
            "SELECT {} FROM user_entitlements {} ORDER BY created_at DESC LIMIT $8 OFFSET $9",
            ENTITLEMENT_COLUMNS, where_clause
        ))
        .bind(&filter.entitlement_id)
        .bind(&filter.phone)
        .bind(&filter.order_id)
        .bind(&filter.rule_id)
        .bind(&filter.course_name)
        .bind(&filter.product_name)
        .bind(filter.is_active)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM user_entitlements {}",
            where_clause
        ))
        .bind(&filter.entitlement_id)
        .bind(&filter.phone)
        .bind(&filter.order_id)
        .bind(&filter.rule_id)
        .bind(&filter.course_name)
        .bind(&filter.product_name)
        .bind(filter.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, count.0))
    }

    /// One chunk of the non-deleted entitlement sweep, keyed on
    /// entitlement_id for a stable scan order. The quota resetter pages
    /// through these instead of loading the whole table.
    pub async fn find_active_chunk(
        &self,
        after_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<UserEntitlementEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntitlementEntity>(&format!(
            r#"
            SELECT {} FROM user_entitlements
            WHERE is_deleted = false AND ($1::text IS NULL OR entitlement_id > $1)
            ORDER BY entitlement_id ASC
            LIMIT $2
            "#,
            ENTITLEMENT_COLUMNS
        ))
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Rewrite the remaining-uses counter. Each row's reset is independent
    /// and idempotent.
    pub async fn set_daily_remaining(
        &self,
        entitlement_id: &str,
        daily_remaining: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_entitlements SET daily_remaining = $2 WHERE entitlement_id = $1",
        )
        .bind(entitlement_id)
        .bind(daily_remaining)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Cascade a course rename into non-deleted entitlements via the rules
    /// that reference the course. Runs inside the rename transaction.
    pub async fn update_course_name_in_tx(
        conn: &mut PgConnection,
        course_id: &str,
        course_name: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE user_entitlements
            SET course_name = $2
            WHERE is_deleted = false
              AND rule_id IN (
                  SELECT rule_id FROM entitlement_rules
                  WHERE course_id = $1 AND is_deleted = false
              )
            "#,
        )
        .bind(course_id)
        .bind(course_name)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Cascade a product rename into non-deleted entitlements via the rules
    /// that reference the product.
    pub async fn update_product_name_in_tx(
        conn: &mut PgConnection,
        ai_product_id: &str,
        product_name: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE user_entitlements
            SET product_name = $2
            WHERE is_deleted = false
              AND rule_id IN (
                  SELECT rule_id FROM entitlement_rules
                  WHERE ai_product_id = $1 AND is_deleted = false
              )
            "#,
        )
        .bind(ai_product_id)
        .bind(product_name)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Count non-deleted entitlements.
    pub async fn count_active(&self) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_entitlements WHERE is_deleted = false")
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }
}
