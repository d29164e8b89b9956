//! Prefixed record ID generation.
//!
//! Every row gets a human-scannable string key: an uppercase prefix naming
//! the record kind, an underscore, and a hyphen-less UUID v4. Order IDs are
//! the exception — they come from the external payment provider and are
//! stored verbatim.

use uuid::Uuid;

/// Generates an ID of the form `PREFIX_<32 hex chars>`.
pub fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Generates a course ID (`COURSE_…`).
pub fn course_id() -> String {
    generate_id("COURSE")
}

/// Generates an AI product ID (`AI_…`).
pub fn ai_product_id() -> String {
    generate_id("AI")
}

/// Generates an entitlement rule ID (`RULE_…`).
pub fn rule_id() -> String {
    generate_id("RULE")
}

/// Generates a user entitlement ID (`ENT_…`).
pub fn entitlement_id() -> String {
    generate_id("ENT")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_shape() {
        let id = generate_id("COURSE");
        let (prefix, rest) = id.split_once('_').expect("missing separator");
        assert_eq!(prefix, "COURSE");
        assert_eq!(rest.len(), 32);
        assert!(rest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = entitlement_id();
        let b = entitlement_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_kind_prefixes() {
        assert!(course_id().starts_with("COURSE_"));
        assert!(ai_product_id().starts_with("AI_"));
        assert!(rule_id().starts_with("RULE_"));
        assert!(entitlement_id().starts_with("ENT_"));
    }
}
