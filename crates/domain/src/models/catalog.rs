//! Shared catalog-entity state handling.
//!
//! Courses and AI products are soft-deletable named entities with identical
//! lifecycle rules: a record is either active or soft-deleted, and creating
//! a name held by a soft-deleted record resurrects it instead of inserting
//! a duplicate.

use serde::Serialize;

/// Lifecycle state of a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogStatus {
    Active,
    SoftDeleted,
}

impl CatalogStatus {
    /// Derives the status from the stored soft-delete flag.
    pub fn from_deleted_flag(is_deleted: bool) -> Self {
        if is_deleted {
            CatalogStatus::SoftDeleted
        } else {
            CatalogStatus::Active
        }
    }
}

/// Result of a catalog `create`: a fresh insert or the resurrection of a
/// soft-deleted record holding the same name.
#[derive(Debug, Clone)]
pub enum CreateOutcome<T> {
    Created(T),
    Resurrected(T),
}

impl<T> CreateOutcome<T> {
    /// The record regardless of how it came to exist.
    pub fn into_inner(self) -> T {
        match self {
            CreateOutcome::Created(inner) | CreateOutcome::Resurrected(inner) => inner,
        }
    }

    pub fn was_resurrected(&self) -> bool {
        matches!(self, CreateOutcome::Resurrected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_flag() {
        assert_eq!(
            CatalogStatus::from_deleted_flag(false),
            CatalogStatus::Active
        );
        assert_eq!(
            CatalogStatus::from_deleted_flag(true),
            CatalogStatus::SoftDeleted
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = CreateOutcome::Resurrected("COURSE_1");
        assert!(outcome.was_resurrected());
        assert_eq!(outcome.into_inner(), "COURSE_1");

        let outcome = CreateOutcome::Created("COURSE_2");
        assert!(!outcome.was_resurrected());
    }
}
