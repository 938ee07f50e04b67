//! Monthly spending limits per category.
//!
//! This module contains:
//! - The `Budget` model and the `BudgetPeriod` it applies to
//! - Database functions for setting, bulk updating and removing budgets
//! - JSON route handlers for the budget API

mod core;
mod handlers;

pub use core::{
    Budget, BudgetPeriod, BudgetWithSpending, BulkBudgetResult, MIN_BUDGET_YEAR, budget_limits,
    bulk_upsert_or_delete, create_budget, create_budget_table, delete_budget, get_budgets,
    get_budgets_with_spending, normalize_category_name, upsert_budget,
};
pub use handlers::{
    BudgetState, bulk_update_budgets_endpoint, create_budget_endpoint, delete_budget_endpoint,
    get_budgets_endpoint,
};
