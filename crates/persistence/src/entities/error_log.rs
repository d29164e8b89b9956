//! Error log entity (database row mapping).
//!
//! Shared by the upload_error_orders and batch_generate_errors tables,
//! which have identical shapes.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::ErrorLogEntry;

/// Database row mapping for an append-only error log table.
#[derive(Debug, Clone, FromRow)]
pub struct ErrorLogEntity {
    pub id: i64,
    pub order_id: String,
    pub error_message: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ErrorLogEntity> for ErrorLogEntry {
    fn from(entity: ErrorLogEntity) -> Self {
        Self {
            id: entity.id,
            order_id: entity.order_id,
            error_message: entity.error_message,
            created_at: entity.created_at,
        }
    }
}
