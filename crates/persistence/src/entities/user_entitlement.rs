//! User entitlement entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::UserEntitlement;

/// Database row mapping for the user_entitlements table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntitlementEntity {
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
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntitlementEntity> for UserEntitlement {
    fn from(entity: UserEntitlementEntity) -> Self {
        Self {
            entitlement_id: entity.entitlement_id,
            phone: entity.phone,
            order_id: entity.order_id,
            rule_id: entity.rule_id,
            course_name: entity.course_name,
            product_name: entity.product_name,
            ai_product_id: entity.ai_product_id,
            start_date: entity.start_date,
            end_date: entity.end_date,
            is_active: entity.is_active,
            daily_remaining: entity.daily_remaining,
            is_deleted: entity.is_deleted,
            created_at: entity.created_at,
        }
    }
}
