//! Entitlement rule repository for database operations.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};

use crate::entities::EntitlementRuleEntity;
use domain::models::entitlement_rule::RuleFilter;
use shared::pagination::Page;

const RULE_COLUMNS: &str = "rule_id, course_id, course_name, ai_product_id, product_name, \
     daily_limit, validity_days, is_deleted, created_at";

/// Repository for entitlement-rule database operations.
#[derive(Clone)]
pub struct EntitlementRuleRepository {
    pool: PgPool,
}

impl EntitlementRuleRepository {
    /// Creates a new EntitlementRuleRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a rule by its ID, regardless of soft-delete state.
    pub async fn find_by_id(
        &self,
        rule_id: &str,
    ) -> Result<Option<EntitlementRuleEntity>, sqlx::Error> {
        sqlx::query_as::<_, EntitlementRuleEntity>(&format!(
            "SELECT {} FROM entitlement_rules WHERE rule_id = $1",
            RULE_COLUMNS
        ))
        .bind(rule_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find the non-deleted rule for a (course, product) pair, if any.
    pub async fn find_active_by_pair(
        &self,
        course_id: &str,
        ai_product_id: &str,
    ) -> Result<Option<EntitlementRuleEntity>, sqlx::Error> {
        sqlx::query_as::<_, EntitlementRuleEntity>(&format!(
            r#"
            SELECT {} FROM entitlement_rules
            WHERE course_id = $1 AND ai_product_id = $2 AND is_deleted = false
            "#,
            RULE_COLUMNS
        ))
        .bind(course_id)
        .bind(ai_product_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// First non-deleted rule for a course, oldest first. The engine derives
    /// entitlements from this rule when an order names only a course.
    pub async fn find_active_by_course(
        &self,
        course_id: &str,
    ) -> Result<Option<EntitlementRuleEntity>, sqlx::Error> {
        sqlx::query_as::<_, EntitlementRuleEntity>(&format!(
            r#"
            SELECT {} FROM entitlement_rules
            WHERE course_id = $1 AND is_deleted = false
            ORDER BY created_at ASC
            LIMIT 1
            "#,
            RULE_COLUMNS
        ))
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert a new rule with denormalized course/product names.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        &self,
        rule_id: &str,
        course_id: &str,
        course_name: &str,
        ai_product_id: &str,
        product_name: &str,
        daily_limit: i32,
        validity_days: i32,
    ) -> Result<EntitlementRuleEntity, sqlx::Error> {
        sqlx::query_as::<_, EntitlementRuleEntity>(&format!(
            r#"
            INSERT INTO entitlement_rules
                (rule_id, course_id, course_name, ai_product_id, product_name,
                 daily_limit, validity_days, is_deleted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, false, $8)
            RETURNING {}
            "#,
            RULE_COLUMNS
        ))
        .bind(rule_id)
        .bind(course_id)
        .bind(course_name)
        .bind(ai_product_id)
        .bind(product_name)
        .bind(daily_limit)
        .bind(validity_days)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    /// Rewrite a rule with fully resolved values. The service merges the
    /// update request into the existing row before calling this.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        rule_id: &str,
        course_id: &str,
        course_name: &str,
        ai_product_id: &str,
        product_name: &str,
        daily_limit: i32,
        validity_days: i32,
    ) -> Result<Option<EntitlementRuleEntity>, sqlx::Error> {
        sqlx::query_as::<_, EntitlementRuleEntity>(&format!(
            r#"
            UPDATE entitlement_rules
            SET course_id = $2, course_name = $3, ai_product_id = $4,
                product_name = $5, daily_limit = $6, validity_days = $7
            WHERE rule_id = $1
            RETURNING {}
            "#,
            RULE_COLUMNS
        ))
        .bind(rule_id)
        .bind(course_id)
        .bind(course_name)
        .bind(ai_product_id)
        .bind(product_name)
        .bind(daily_limit)
        .bind(validity_days)
        .fetch_optional(&self.pool)
        .await
    }

    /// Soft-delete a rule. Returns the number of rows affected.
    pub async fn soft_delete(&self, rule_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE entitlement_rules SET is_deleted = true WHERE rule_id = $1 AND is_deleted = false",
        )
        .bind(rule_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Cascade a course rename into every non-deleted rule referencing it.
    /// Runs inside the rename transaction.
    pub async fn update_course_name_in_tx(
        conn: &mut PgConnection,
        course_id: &str,
        course_name: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE entitlement_rules
            SET course_name = $2
            WHERE course_id = $1 AND is_deleted = false
            "#,
        )
        .bind(course_id)
        .bind(course_name)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Cascade a product rename into every non-deleted rule referencing it.
    pub async fn update_product_name_in_tx(
        conn: &mut PgConnection,
        ai_product_id: &str,
        product_name: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE entitlement_rules
            SET product_name = $2
            WHERE ai_product_id = $1 AND is_deleted = false
            "#,
        )
        .bind(ai_product_id)
        .bind(product_name)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Filtered rule listing. All filter fields are ANDed; only non-deleted
    /// rules are returned.
    pub async fn find_by_filter(
        &self,
        filter: &RuleFilter,
        page: Page,
    ) -> Result<(Vec<EntitlementRuleEntity>, i64), sqlx::Error> {
        let where_clause = r#"
            WHERE is_deleted = false
              AND ($1::text IS NULL OR rule_id = $1)
              AND ($2::text IS NULL OR course_id = $2)
              AND ($3::text IS NULL OR ai_product_id = $3)
              AND ($4::text IS NULL OR course_name = $4)
              AND ($5::text IS NULL OR product_name = $5)
              AND ($6::int4 IS NULL OR daily_limit = $6)
              AND ($7::int4 IS NULL OR validity_days = $7)
        "#;

        let items = sqlx::query_as::<_, EntitlementRuleEntity>(&format!(
            "SELECT {} FROM entitlement_rules {} ORDER BY created_at DESC LIMIT $8 OFFSET $9",
            RULE_COLUMNS, where_clause
        ))
        .bind(&filter.rule_id)
        .bind(&filter.course_id)
        .bind(&filter.ai_product_id)
        .bind(&filter.course_name)
        .bind(&filter.product_name)
        .bind(filter.daily_limit)
        .bind(filter.validity_days)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM entitlement_rules {}",
            where_clause
        ))
        .bind(&filter.rule_id)
        .bind(&filter.course_id)
        .bind(&filter.ai_product_id)
        .bind(&filter.course_name)
        .bind(&filter.product_name)
        .bind(filter.daily_limit)
        .bind(filter.validity_days)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, count.0))
    }

    /// Count non-deleted rules.
    pub async fn count_active(&self) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM entitlement_rules WHERE is_deleted = false")
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }
}
