//! Shared utilities and common types for the Entitlement Admin backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Prefixed record ID generation
//! - Offset pagination parameters
//! - Common validation and normalization logic

pub mod ids;
pub mod pagination;
pub mod validation;
