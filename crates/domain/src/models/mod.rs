//! Domain model definitions.

pub mod ai_product;
pub mod catalog;
pub mod course;
pub mod entitlement_rule;
pub mod error_log;
pub mod order;
pub mod reports;
pub mod user_entitlement;

pub use ai_product::AiProduct;
pub use catalog::{CatalogStatus, CreateOutcome};
pub use course::Course;
pub use entitlement_rule::EntitlementRule;
pub use error_log::ErrorLogEntry;
pub use order::{Order, ReconcileAction, RefundMarker};
pub use user_entitlement::UserEntitlement;

use crate::error::DomainError;

/// Coerces a JSON value into an integer.
///
/// Operator tooling sends numeric fields as either JSON numbers or numeric
/// strings; anything else is a validation failure naming the field.
pub(crate) fn coerce_int(field: &str, value: &serde_json::Value) -> Result<i32, DomainError> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| {
                DomainError::Validation(format!("{} must be an integer", field))
            }),
        serde_json::Value::String(s) => s.trim().parse::<i32>().map_err(|_| {
            DomainError::Validation(format!("{} must be an integer", field))
        }),
        _ => Err(DomainError::Validation(format!(
            "{} must be an integer",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_int_from_number() {
        assert_eq!(coerce_int("daily_limit", &json!(5)).unwrap(), 5);
    }

    #[test]
    fn test_coerce_int_from_string() {
        assert_eq!(coerce_int("daily_limit", &json!(" 30 ")).unwrap(), 30);
    }

    #[test]
    fn test_coerce_int_rejects_non_numeric() {
        let err = coerce_int("validity_days", &json!("soon")).unwrap_err();
        assert!(err.to_string().contains("validity_days"));
        let err = coerce_int("validity_days", &json!(2.5)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(coerce_int("validity_days", &json!(true)).is_err());
    }
}
