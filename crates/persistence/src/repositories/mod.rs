//! Repository implementations for database operations.

pub mod ai_product;
pub mod course;
pub mod entitlement_rule;
pub mod error_log;
pub mod order;
pub mod user_entitlement;

pub use ai_product::AiProductRepository;
pub use course::CourseRepository;
pub use entitlement_rule::EntitlementRuleRepository;
pub use error_log::ErrorLogRepository;
pub use order::{NewOrder, OrderRepository, OrderRowFilter, OrderUpdate};
pub use user_entitlement::{
    EntitlementRowFilter, EntitlementUpdate, NewUserEntitlement, UserEntitlementRepository,
};
