//! HTTP route handlers.

pub mod admin;
pub mod ai_products;
pub mod courses;
pub mod entitlement_rules;
pub mod error_logs;
pub mod health;
pub mod order_import;
pub mod orders;
pub mod user_entitlements;
