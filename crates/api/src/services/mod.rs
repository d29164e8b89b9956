//! Engine services: the business logic behind the thin HTTP handlers and
//! the background jobs.

pub mod order_import;
pub mod quota_reset;
pub mod reconciliation;

pub use order_import::OrderImportService;
pub use quota_reset::QuotaResetService;
pub use reconciliation::{GenerateOutcome, ReconciliationService};
