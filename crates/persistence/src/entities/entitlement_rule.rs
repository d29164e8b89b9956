//! Entitlement rule entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::EntitlementRule;

/// Database row mapping for the entitlement_rules table.
#[derive(Debug, Clone, FromRow)]
pub struct EntitlementRuleEntity {
    pub rule_id: String,
    pub course_id: String,
    pub course_name: String,
    pub ai_product_id: String,
    pub product_name: String,
    pub daily_limit: i32,
    pub validity_days: i32,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<EntitlementRuleEntity> for EntitlementRule {
    fn from(entity: EntitlementRuleEntity) -> Self {
        Self {
            rule_id: entity.rule_id,
            course_id: entity.course_id,
            course_name: entity.course_name,
            ai_product_id: entity.ai_product_id,
            product_name: entity.product_name,
            daily_limit: entity.daily_limit,
            validity_days: entity.validity_days,
            is_deleted: entity.is_deleted,
            created_at: entity.created_at,
        }
    }
}
