//! Bulk order importer.
//!
//! Consumes pre-parsed spreadsheet rows and pushes each through a
//! restricted version of the single-order create rules. Rows never abort
//! the batch: every skip is recorded as an upload error with a reason the
//! operator can act on.
//!
//! One deliberate exception to the order store's rules lives here: a row
//! marked refunded for an order we already hold un-refunded is applied as a
//! refund transition. That is the only import-time refund toggle in the
//! system.

use sqlx::PgPool;
use tracing::{error, info};

use domain::error::DomainError;
use domain::models::reports::{ImportOrderRow, ImportReport};
use domain::models::RefundMarker;
use persistence::repositories::{CourseRepository, ErrorLogRepository, NewOrder, OrderRepository};
use shared::validation::{normalize_name, parse_purchase_time};

/// What importing one row did.
enum RowOutcome {
    /// A fresh order was inserted.
    Created,
    /// An existing order was transitioned to refunded.
    RefundApplied,
}

/// The bulk order importer.
#[derive(Clone)]
pub struct OrderImportService {
    pool: PgPool,
}

impl OrderImportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Import a batch of order rows. Returns aggregate counts plus the full
    /// list of per-row error messages, mirroring the batch-generation
    /// report shape.
    pub async fn import_orders(
        &self,
        rows: Vec<ImportOrderRow>,
    ) -> Result<ImportReport, DomainError> {
        let mut report = ImportReport {
            total: rows.len(),
            ..Default::default()
        };

        for row in &rows {
            match self.import_row(row).await {
                Ok(RowOutcome::Created) => report.success += 1,
                Ok(RowOutcome::RefundApplied) => {
                    report.updated += 1;
                    report.success += 1;
                }
                Err(message) => {
                    let order_id = row.order_id.as_deref().unwrap_or("unknown");
                    self.record_error(order_id, &message).await;
                    report.error_messages.push(message);
                    report.error += 1;
                }
            }
        }

        info!(
            total = report.total,
            success = report.success,
            updated = report.updated,
            error = report.error,
            "Order import finished"
        );
        Ok(report)
    }

    /// Validate and apply one row. The returned string is the operator-facing
    /// reason recorded in the upload error log.
    async fn import_row(&self, row: &ImportOrderRow) -> Result<RowOutcome, String> {
        let order_id = non_empty(&row.order_id);
        let phone = non_empty(&row.phone);
        let course_name = non_empty(&row.course_name);
        let purchase_time = non_empty(&row.purchase_time);
        let is_refund = non_empty(&row.is_refund);

        let label = order_id.unwrap_or("unknown");

        let (Some(order_id), Some(phone), Some(course_name), Some(purchase_time), Some(marker)) =
            (order_id, phone, course_name, purchase_time, is_refund)
        else {
            return Err(format!("Order {} has incomplete data", label));
        };

        let course_name = normalize_name(course_name);

        let marker = RefundMarker::parse(marker)
            .map_err(|_| format!("Order {} has an invalid refund marker", order_id))?;

        let purchase_time = parse_purchase_time(purchase_time)
            .map_err(|_| format!("Order {} has a bad purchase time format", order_id))?;

        let course_repo = CourseRepository::new(self.pool.clone());
        let course = course_repo
            .find_by_name(&course_name, false)
            .await
            .map_err(|e| format!("Order {} failed to save: {}", order_id, e))?
            .ok_or_else(|| {
                format!("Order {} references unknown course {}", order_id, course_name)
            })?;

        let order_repo = OrderRepository::new(self.pool.clone());
        let existing = order_repo
            .find_by_id(order_id)
            .await
            .map_err(|e| format!("Order {} failed to save: {}", order_id, e))?;

        if let Some(existing) = existing {
            return if !existing.is_refund && marker.is_refund() {
                // The one import-time refund toggle: an order we hold as
                // un-refunded arrives marked refunded.
                order_repo
                    .mark_refunded(order_id)
                    .await
                    .map_err(|e| format!("Order {} failed to save: {}", order_id, e))?;
                Ok(RowOutcome::RefundApplied)
            } else if existing.is_refund && marker.is_refund() {
                Err(format!("Order {} is already refunded", order_id))
            } else {
                Err(format!("Order {} already exists", order_id))
            };
        }

        if marker.is_refund() {
            // A refunded order can never be created as refunded.
            return Err(format!("Order {} is already refunded", order_id));
        }

        order_repo
            .insert(&NewOrder {
                order_id: order_id.to_string(),
                phone: phone.to_string(),
                course_id: course.course_id.clone(),
                purchase_time,
                is_refund: false,
            })
            .await
            .map_err(|e| format!("Order {} failed to save: {}", order_id, e))?;

        Ok(RowOutcome::Created)
    }

    /// Best-effort error-log append; a failed audit write must not fail the
    /// import.
    async fn record_error(&self, order_id: &str, message: &str) {
        let error_log = ErrorLogRepository::new(self.pool.clone());
        if let Err(e) = error_log.insert_upload_error(order_id, message).await {
            error!(order_id = %order_id, error = %e, "Failed to record upload error");
        }
    }
}

/// Treats missing and blank cells the same way.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_filters_blank_cells() {
        assert_eq!(non_empty(&Some("PAY1".into())), Some("PAY1"));
        assert_eq!(non_empty(&Some("  ".into())), None);
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some(" PAY2 ".into())), Some("PAY2"));
    }
}
