//! Aggregated analytics derived from the transaction log and budgets.
//!
//! The engine in this module is a pure function of its inputs, so it can be
//! called from request handlers and from each live dashboard session alike.

mod budget_status;
mod endpoint;
mod engine;

pub use budget_status::{
    BudgetHealth, BudgetStatus, OVER_THRESHOLD_PERCENT, WARNING_THRESHOLD_PERCENT, budget_status,
};
pub use endpoint::{AnalyticsQuery, AnalyticsState, get_analytics_endpoint};
pub use engine::{
    AnalyticsOptions, AnalyticsSnapshot, Budgets, CategoryFilter, CategoryTotal, MonthlyTotal,
    RECENT_TRANSACTION_LIMIT, TOP_CATEGORY_LIMIT, compute_analytics, top_categories,
};
