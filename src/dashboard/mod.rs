//! Dashboard module
//!
//! Summarizes the ledger: balances, income against expenses over time,
//! spending per category, the 50/30/20 budget rule and upcoming goals.

mod aggregation;
mod entry;
mod summary;

pub use aggregation::{BucketReport, CategoryExpense, MonthlyTotals};
pub use summary::{DEFAULT_PERIOD_DAYS, DashboardSummary, default_date_range, get_dashboard_summary};
