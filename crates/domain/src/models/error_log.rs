//! Audit log entries for partial-failure reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One recorded failure, from either the bulk order upload or a batch
/// entitlement generation run. Append-only; operators page through these to
/// chase down skipped rows.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorLogEntry {
    pub id: i64,
    pub order_id: String,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
}
