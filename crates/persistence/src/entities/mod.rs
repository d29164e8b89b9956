//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod ai_product;
pub mod course;
pub mod entitlement_rule;
pub mod error_log;
pub mod order;
pub mod user_entitlement;

pub use ai_product::AiProductEntity;
pub use course::CourseEntity;
pub use entitlement_rule::EntitlementRuleEntity;
pub use error_log::ErrorLogEntity;
pub use order::OrderEntity;
pub use user_entitlement::UserEntitlementEntity;
