//! Entitlement rule model and DTOs.
//!
//! A rule binds a (course, AI product) pair to a usage policy: how many
//! calls per day an entitlement allows and how many days it stays valid.
//! Course and product names are denormalized onto the rule for fast list
//! reads and kept in sync by the catalog rename cascade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::coerce_int;
use crate::error::DomainError;

/// Default daily usage limit applied when a rule omits one.
pub const DEFAULT_DAILY_LIMIT: i32 = 5;

/// Default validity period in days applied when a rule omits one.
pub const DEFAULT_VALIDITY_DAYS: i32 = 30;

/// Usage policy for one (course, AI product) pair. At most one non-deleted
/// rule may exist per pair.
#[derive(Debug, Clone)]
pub struct EntitlementRule {
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

/// Request to create an entitlement rule.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEntitlementRuleRequest {
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub course_id: String,
    #[validate(length(min = 1, message = "ai_product_id must not be empty"))]
    pub ai_product_id: String,
    #[validate(range(min = 1, message = "daily_limit must be positive"))]
    pub daily_limit: Option<i32>,
    #[validate(range(min = 1, message = "validity_days must be positive"))]
    pub validity_days: Option<i32>,
}

/// Request to update an entitlement rule.
///
/// The referenced course/product can be swapped by id or by name; either
/// side re-denormalizes the other. Numeric fields arrive as JSON numbers or
/// numeric strings and are coerced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntitlementRuleRequest {
    pub course_id: Option<String>,
    pub course_name: Option<String>,
    pub ai_product_id: Option<String>,
    pub product_name: Option<String>,
    pub daily_limit: Option<serde_json::Value>,
    pub validity_days: Option<serde_json::Value>,
}

impl UpdateEntitlementRuleRequest {
    pub fn is_empty(&self) -> bool {
        self.course_id.is_none()
            && self.course_name.is_none()
            && self.ai_product_id.is_none()
            && self.product_name.is_none()
            && self.daily_limit.is_none()
            && self.validity_days.is_none()
    }

    /// Coerced daily limit, if present.
    pub fn daily_limit(&self) -> Result<Option<i32>, DomainError> {
        self.daily_limit
            .as_ref()
            .map(|v| coerce_int("daily_limit", v))
            .transpose()
    }

    /// Coerced validity period, if present.
    pub fn validity_days(&self) -> Result<Option<i32>, DomainError> {
        self.validity_days
            .as_ref()
            .map(|v| coerce_int("validity_days", v))
            .transpose()
    }
}

/// Filter for rule queries. All fields are ANDed; `is_deleted=false` is
/// always implied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleFilter {
    pub rule_id: Option<String>,
    pub course_id: Option<String>,
    pub ai_product_id: Option<String>,
    pub course_name: Option<String>,
    pub product_name: Option<String>,
    pub daily_limit: Option<i32>,
    pub validity_days: Option<i32>,
}

/// Rule as rendered to the admin UI.
#[derive(Debug, Clone, Serialize)]
pub struct EntitlementRuleResponse {
    pub rule_id: String,
    pub course_id: String,
    pub course_name: String,
    pub ai_product_id: String,
    pub product_name: String,
    pub daily_limit: i32,
    pub validity_days: i32,
    pub created_at: DateTime<Utc>,
}

impl From<EntitlementRule> for EntitlementRuleResponse {
    fn from(rule: EntitlementRule) -> Self {
        Self {
            rule_id: rule.rule_id,
            course_id: rule.course_id,
            course_name: rule.course_name,
            ai_product_id: rule.ai_product_id,
            product_name: rule.product_name,
            daily_limit: rule.daily_limit,
            validity_days: rule.validity_days,
            created_at: rule.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_request_coerces_numeric_strings() {
        let request: UpdateEntitlementRuleRequest = serde_json::from_value(json!({
            "daily_limit": "7",
            "validity_days": 14
        }))
        .unwrap();
        assert_eq!(request.daily_limit().unwrap(), Some(7));
        assert_eq!(request.validity_days().unwrap(), Some(14));
    }

    #[test]
    fn test_update_request_rejects_non_numeric() {
        let request: UpdateEntitlementRuleRequest = serde_json::from_value(json!({
            "daily_limit": "unlimited"
        }))
        .unwrap();
        assert!(matches!(
            request.daily_limit(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_update_request_empty_detection() {
        let request = UpdateEntitlementRuleRequest::default();
        assert!(request.is_empty());

        let request: UpdateEntitlementRuleRequest =
            serde_json::from_value(json!({ "course_id": "COURSE_1" })).unwrap();
        assert!(!request.is_empty());
    }

    #[test]
    fn test_create_request_rejects_zero_limit() {
        let request = CreateEntitlementRuleRequest {
            course_id: "COURSE_1".into(),
            ai_product_id: "AI_1".into(),
            daily_limit: Some(0),
            validity_days: None,
        };
        assert!(request.validate().is_err());
    }
}
