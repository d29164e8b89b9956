//! User entitlement model and DTOs.
//!
//! An entitlement is a materialized, time-boxed grant derived from exactly
//! one rule at creation time. Policy fields are copied from the rule, not
//! referenced live — later rule edits do not retroactively change issued
//! grants except where the reconciliation engine re-derives them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::coerce_int;
use crate::error::DomainError;

/// A per-user grant of access to an AI product.
///
/// `order_id` is None for manual grants. Manually created grants start
/// dormant (`is_active=false`) until the login flow activates them; grants
/// generated from a real order start active.
#[derive(Debug, Clone)]
pub struct UserEntitlement {
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

/// Request for a manual grant, bypassing any order.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserEntitlementRequest {
    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: String,
    #[validate(length(min = 1, message = "rule_id must not be empty"))]
    pub rule_id: String,
}

/// Request to update an entitlement. Only these fields are mutable.
///
/// Setting `order_id` marks the referenced order as generated and
/// not-refunded (the operator is hand-linking a grant to an order).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserEntitlementRequest {
    pub phone: Option<String>,
    pub rule_id: Option<String>,
    pub end_date: Option<String>,
    pub daily_remaining: Option<serde_json::Value>,
    pub is_active: Option<bool>,
    pub order_id: Option<String>,
}

impl UpdateUserEntitlementRequest {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none()
            && self.rule_id.is_none()
            && self.end_date.is_none()
            && self.daily_remaining.is_none()
            && self.is_active.is_none()
            && self.order_id.is_none()
    }

    /// Coerced remaining-uses counter, if present.
    pub fn daily_remaining(&self) -> Result<Option<i32>, DomainError> {
        self.daily_remaining
            .as_ref()
            .map(|v| coerce_int("daily_remaining", v))
            .transpose()
    }

    /// Parsed end date (RFC 3339), if present.
    pub fn end_date(&self) -> Result<Option<DateTime<Utc>>, DomainError> {
        self.end_date
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| {
                        DomainError::Validation(
                            "end_date must be an RFC 3339 datetime".into(),
                        )
                    })
            })
            .transpose()
    }
}

/// Filter for entitlement queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntitlementFilter {
    pub entitlement_id: Option<String>,
    pub phone: Option<String>,
    pub order_id: Option<String>,
    pub rule_id: Option<String>,
    pub course_name: Option<String>,
    pub product_name: Option<String>,
    pub is_active: Option<bool>,
}

/// Entitlement as rendered to the admin UI.
#[derive(Debug, Clone, Serialize)]
pub struct UserEntitlementResponse {
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
    pub created_at: DateTime<Utc>,
}

impl From<UserEntitlement> for UserEntitlementResponse {
    fn from(e: UserEntitlement) -> Self {
        Self {
            entitlement_id: e.entitlement_id,
            phone: e.phone,
            order_id: e.order_id,
            rule_id: e.rule_id,
            course_name: e.course_name,
            product_name: e.product_name,
            ai_product_id: e.ai_product_id,
            start_date: e.start_date,
            end_date: e.end_date,
            is_active: e.is_active,
            daily_remaining: e.daily_remaining,
            created_at: e.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_request_parses_end_date() {
        let request: UpdateUserEntitlementRequest = serde_json::from_value(json!({
            "end_date": "2024-07-01T00:00:00Z"
        }))
        .unwrap();
        let parsed = request.end_date().unwrap().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-07-01T00:00:00+00:00");
    }

    #[test]
    fn test_update_request_rejects_bad_end_date() {
        let request: UpdateUserEntitlementRequest = serde_json::from_value(json!({
            "end_date": "next tuesday"
        }))
        .unwrap();
        assert!(matches!(
            request.end_date(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_update_request_coerces_daily_remaining() {
        let request: UpdateUserEntitlementRequest = serde_json::from_value(json!({
            "daily_remaining": "3"
        }))
        .unwrap();
        assert_eq!(request.daily_remaining().unwrap(), Some(3));
    }

    #[test]
    fn test_manual_grant_request_requires_valid_phone() {
        let request = CreateUserEntitlementRequest {
            phone: "13800000000".into(),
            rule_id: "RULE_1".into(),
        };
        assert!(request.validate().is_ok());

        let request = CreateUserEntitlementRequest {
            phone: "555-0100".into(),
            rule_id: "RULE_1".into(),
        };
        assert!(request.validate().is_err());
    }
}
