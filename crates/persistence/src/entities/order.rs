//! Order entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::Order;

/// Database row mapping for the orders table.
#[derive(Debug, Clone, FromRow)]
pub struct OrderEntity {
    pub order_id: String,
    pub phone: String,
    pub course_id: String,
    pub purchase_time: DateTime<Utc>,
    pub is_refund: bool,
    pub is_generate: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<OrderEntity> for Order {
    fn from(entity: OrderEntity) -> Self {
        Self {
            order_id: entity.order_id,
            phone: entity.phone,
            course_id: entity.course_id,
            purchase_time: entity.purchase_time,
            is_refund: entity.is_refund,
            is_generate: entity.is_generate,
            is_deleted: entity.is_deleted,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::ReconcileAction;

    #[test]
    fn test_fresh_order_maps_to_generate_action() {
        let entity = OrderEntity {
            order_id: "PAY1".into(),
            phone: "13800000000".into(),
            course_id: "COURSE_abc".into(),
            purchase_time: Utc::now(),
            is_refund: false,
            is_generate: false,
            is_deleted: false,
            created_at: Utc::now(),
        };
        let order: Order = entity.into();
        assert_eq!(order.reconcile_action(), ReconcileAction::Generate);
    }
}
