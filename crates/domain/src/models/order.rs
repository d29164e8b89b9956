//! Order model, refund markers, and the reconciliation state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::DomainError;

/// Refund marker token for a refunded order, as exported by the payment
/// provider.
pub const REFUND_MARKER_REFUNDED: &str = "已退款";

/// Refund marker token for an order that has not been refunded.
pub const REFUND_MARKER_NONE: &str = "无";

/// A purchase event. `order_id` is the provider's payment id, stored
/// verbatim; the course reference is kept by id (the id is authoritative on
/// this entity, names are not denormalized here).
#[derive(Debug, Clone)]
pub struct Order {
    pub order_id: String,
    pub phone: String,
    pub course_id: String,
    pub purchase_time: DateTime<Utc>,
    pub is_refund: bool,
    pub is_generate: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// What the reconciliation engine should do with this order.
    pub fn reconcile_action(&self) -> ReconcileAction {
        ReconcileAction::for_flags(self.is_refund, self.is_generate)
    }
}

/// External representation of the refund flag. Only the two literal
/// provider tokens are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundMarker {
    Refunded,
    None,
}

impl RefundMarker {
    /// Parses a provider token. Anything but the two literals is a
    /// validation failure.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw.trim() {
            REFUND_MARKER_REFUNDED => Ok(RefundMarker::Refunded),
            REFUND_MARKER_NONE => Ok(RefundMarker::None),
            other => Err(DomainError::Validation(format!(
                "is_refund must be '{}' or '{}', got '{}'",
                REFUND_MARKER_REFUNDED, REFUND_MARKER_NONE, other
            ))),
        }
    }

    pub fn is_refund(&self) -> bool {
        matches!(self, RefundMarker::Refunded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefundMarker::Refunded => REFUND_MARKER_REFUNDED,
            RefundMarker::None => REFUND_MARKER_NONE,
        }
    }
}

impl From<bool> for RefundMarker {
    fn from(is_refund: bool) -> Self {
        if is_refund {
            RefundMarker::Refunded
        } else {
            RefundMarker::None
        }
    }
}

/// Action the reconciliation engine takes for an order, keyed on its
/// `(is_refund, is_generate)` flags.
///
/// | is_refund | is_generate | action            |
/// |-----------|-------------|-------------------|
/// | false     | false       | Generate          |
/// | false     | true        | AlreadyGenerated  |
/// | true      | true        | Retire            |
/// | true      | false       | NothingToRetire   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// New, ungenerated order: derive a fresh entitlement.
    Generate,
    /// Entitlement already derived; generating again is a conflict.
    AlreadyGenerated,
    /// Refunded order whose entitlement still exists: retire it.
    Retire,
    /// Refunded with nothing generated. Terminal, nothing to do.
    NothingToRetire,
}

impl ReconcileAction {
    pub fn for_flags(is_refund: bool, is_generate: bool) -> Self {
        match (is_refund, is_generate) {
            (false, false) => ReconcileAction::Generate,
            (false, true) => ReconcileAction::AlreadyGenerated,
            (true, true) => ReconcileAction::Retire,
            (true, false) => ReconcileAction::NothingToRetire,
        }
    }
}

/// Request to create an order.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 50, message = "order_id must be 1-50 characters"))]
    pub order_id: String,
    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: String,
    #[validate(length(min = 1, message = "course_name must not be empty"))]
    pub course_name: String,
    #[validate(length(min = 1, message = "purchase_time must not be empty"))]
    pub purchase_time: String,
    #[validate(length(min = 1, message = "is_refund must not be empty"))]
    pub is_refund: String,
}

/// Request to update an order. Only these fields are mutable; course_name
/// is resolved to course_id and dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderRequest {
    pub phone: Option<String>,
    pub course_name: Option<String>,
    pub purchase_time: Option<String>,
    pub is_refund: Option<String>,
    pub is_generate: Option<bool>,
}

impl UpdateOrderRequest {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none()
            && self.course_name.is_none()
            && self.purchase_time.is_none()
            && self.is_refund.is_none()
            && self.is_generate.is_none()
    }
}

/// Filter for order queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub phone: Option<String>,
    pub course_name: Option<String>,
    pub purchase_time: Option<String>,
    pub is_refund: Option<String>,
}

/// Order as rendered to the admin UI.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub phone: String,
    pub course_id: String,
    pub purchase_time: DateTime<Utc>,
    pub is_refund: bool,
    pub is_generate: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.order_id,
            phone: order.phone,
            course_id: order.course_id,
            purchase_time: order.purchase_time,
            is_refund: order.is_refund,
            is_generate: order.is_generate,
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_action_table() {
        assert_eq!(
            ReconcileAction::for_flags(false, false),
            ReconcileAction::Generate
        );
        assert_eq!(
            ReconcileAction::for_flags(false, true),
            ReconcileAction::AlreadyGenerated
        );
        assert_eq!(
            ReconcileAction::for_flags(true, true),
            ReconcileAction::Retire
        );
        assert_eq!(
            ReconcileAction::for_flags(true, false),
            ReconcileAction::NothingToRetire
        );
    }

    #[test]
    fn test_refund_marker_parses_literals_only() {
        assert_eq!(
            RefundMarker::parse("已退款").unwrap(),
            RefundMarker::Refunded
        );
        assert_eq!(RefundMarker::parse(" 无 ").unwrap(), RefundMarker::None);
        assert!(RefundMarker::parse("refunded").is_err());
        assert!(RefundMarker::parse("").is_err());
    }

    #[test]
    fn test_refund_marker_round_trip() {
        for marker in [RefundMarker::Refunded, RefundMarker::None] {
            assert_eq!(RefundMarker::parse(marker.as_str()).unwrap(), marker);
        }
        assert!(RefundMarker::from(true).is_refund());
        assert!(!RefundMarker::from(false).is_refund());
    }

    #[test]
    fn test_create_request_validates_phone() {
        let request = CreateOrderRequest {
            order_id: "ORD1".into(),
            phone: "not-a-phone".into(),
            course_name: "Python Basics".into(),
            purchase_time: "2024-01-01 10:00:00".into(),
            is_refund: "无".into(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_request_empty_detection() {
        assert!(UpdateOrderRequest::default().is_empty());
        let request = UpdateOrderRequest {
            is_generate: Some(true),
            ..Default::default()
        };
        assert!(!request.is_empty());
    }
}
