//! Domain error taxonomy.
//!
//! Every engine operation returns one of these kinds; the HTTP layer maps
//! them to status codes without reinterpreting business meaning. Storage
//! errors are translated at the operation boundary — nothing from `sqlx`
//! escapes the engine untyped.

use thiserror::Error;

/// Error kinds surfaced by engine operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Missing or malformed caller input. Safe to retry after fixing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced entity id/name does not resolve to a live record.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness or state-machine violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A required related entity is absent (e.g. no entitlement rule for a
    /// course). Distinct from NotFound on the primary entity.
    #[error("Dependency missing: {0}")]
    Dependency(String),

    /// Retryable failure; only the nightly sync's retry loop acts on this.
    #[error("Transient error: {0}")]
    Transient(String),

    /// Unexpected failure. Full detail goes to the log; callers get a
    /// generic message.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Whether the nightly sync should retry the failed item.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Transient(_))
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DomainError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => DomainError::Conflict("Record already exists".into()),
                Some("23503") => {
                    DomainError::Dependency("Referenced record not found".into())
                }
                _ => DomainError::Internal(format!("Database error: {}", db_err)),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DomainError::Transient(format!("Database unavailable: {}", err))
            }
            _ => DomainError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    format!(
                        "{}: {}",
                        field,
                        e.message.clone().map(|m| m.to_string()).unwrap_or_default()
                    )
                })
            })
            .collect();
        DomainError::Validation(details.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DomainError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err: DomainError = sqlx::Error::PoolTimedOut.into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            DomainError::Conflict("order already generated".into()).to_string(),
            "Conflict: order already generated"
        );
        assert_eq!(
            DomainError::Dependency("no rule for course".into()).to_string(),
            "Dependency missing: no rule for course"
        );
    }

    #[test]
    fn test_non_transient_kinds() {
        assert!(!DomainError::Validation("x".into()).is_transient());
        assert!(!DomainError::Internal("x".into()).is_transient());
    }
}
