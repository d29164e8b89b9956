//! Aggregate reports returned by batch operations.
//!
//! The bulk importer and the batch generator deliberately share one report
//! shape so operator tooling renders both the same way.

use serde::{Deserialize, Serialize};

/// Result of a `batch_generate` run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchGenerateReport {
    /// Orders considered across both worksets.
    pub total: i64,
    /// Entitlements created for fresh orders.
    pub created: u32,
    /// Entitlements retired for refunded orders.
    pub retired: u32,
    /// Orders that failed and were recorded in the error log.
    pub failed: u32,
    pub error_messages: Vec<String>,
}

/// Result of a bulk order import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Rows received.
    pub total: usize,
    /// Rows that created an order or applied a refund transition.
    pub success: u32,
    /// Subset of `success` that were refund-transition updates.
    pub updated: u32,
    /// Rows skipped and recorded in the error log.
    pub error: u32,
    pub error_messages: Vec<String>,
}

/// One order the nightly sync gave up on after exhausting retries.
#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub order_id: String,
    pub error: String,
    pub retries: u32,
}

/// Result of a nightly order→entitlement sync sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub total_processed: u32,
    pub created: u32,
    pub retired: u32,
    pub failures: Vec<SyncFailure>,
}

/// Result of a daily quota reset sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuotaResetReport {
    /// Non-deleted entitlements scanned.
    pub scanned: u32,
    /// Counters rewritten to their rule's daily limit.
    pub updated: u32,
    /// Entitlements left untouched because their rule is gone.
    pub skipped_missing_rule: u32,
}

/// One pre-parsed spreadsheet row handed to the bulk importer.
///
/// The spreadsheet→row mapping happens in an external parser; by the time a
/// row reaches the importer the provider's column headers have been mapped
/// onto these keys. Everything is optional so the importer itself can
/// report incomplete rows instead of rejecting the whole upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportOrderRow {
    pub order_id: Option<String>,
    pub phone: Option<String>,
    pub course_name: Option<String>,
    pub purchase_time: Option<String>,
    pub is_refund: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_import_row_tolerates_missing_fields() {
        let row: ImportOrderRow = serde_json::from_value(json!({
            "order_id": "PAY123",
            "phone": "13800000000"
        }))
        .unwrap();
        assert_eq!(row.order_id.as_deref(), Some("PAY123"));
        assert!(row.course_name.is_none());
    }

    #[test]
    fn test_report_serialization_shape() {
        let report = BatchGenerateReport {
            total: 3,
            created: 1,
            retired: 1,
            failed: 1,
            error_messages: vec!["order PAY9 has no matching rule".into()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total"], 3);
        assert_eq!(json["error_messages"][0], "order PAY9 has no matching rule");
    }
}
