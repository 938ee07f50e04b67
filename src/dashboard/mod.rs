//! Dashboard module
//!
//! Provides an overview page showing the analytics snapshot as cards, charts
//! and tables, plus a form for setting this month's budgets. The page reloads
//! itself when the live updates socket reports a transaction change.

mod budget_form;
mod cards;
mod charts;
mod handlers;
mod tables;

pub use handlers::{DashboardState, get_dashboard_page, update_dashboard_budgets_endpoint};
