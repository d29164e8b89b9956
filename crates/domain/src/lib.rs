//! Domain layer for the Entitlement Admin backend.
//!
//! This crate contains:
//! - Domain models (Course, AiProduct, EntitlementRule, Order, UserEntitlement)
//! - The order reconciliation state machine
//! - Request/response DTO types for the HTTP layer
//! - The shared domain error taxonomy

pub mod error;
pub mod models;
