//! Classification of spending against a budget.

use serde::{Deserialize, Serialize};

/// Spending at or above this percentage of a budget is a warning.
pub const WARNING_THRESHOLD_PERCENT: f64 = 80.0;
/// Spending above this percentage of a budget is over budget.
pub const OVER_THRESHOLD_PERCENT: f64 = 100.0;

/// How close spending is to a budget's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetHealth {
    /// Under 80% of the budget has been spent.
    Good,
    /// Between 80% and 100% of the budget has been spent.
    Warning,
    /// More than the budget has been spent.
    Over,
}

/// Spending for one category compared with its budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    /// The category display name.
    pub category: String,
    /// The budget limit.
    pub budget: f64,
    /// How much was spent in the budget's month.
    pub spent: f64,
    /// How much is left, never less than zero.
    pub remaining: f64,
    /// `spent` as a percentage of `budget`, rounded to the nearest whole number.
    /// Zero when the budget is zero.
    pub percentage_used: f64,
    /// Whether `spent` exceeds `budget`.
    pub is_over_budget: bool,
    /// The health of the budget.
    pub status: BudgetHealth,
}

/// Compare `spent` against `budget` for `category`.
pub fn budget_status(category: &str, budget: f64, spent: f64) -> BudgetStatus {
    let ratio_percent = if budget > 0.0 {
        spent / budget * 100.0
    } else {
        0.0
    };

    let status = if ratio_percent > OVER_THRESHOLD_PERCENT {
        BudgetHealth::Over
    } else if ratio_percent >= WARNING_THRESHOLD_PERCENT {
        BudgetHealth::Warning
    } else {
        BudgetHealth::Good
    };

    BudgetStatus {
        category: category.to_owned(),
        budget,
        spent,
        remaining: (budget - spent).max(0.0),
        percentage_used: ratio_percent.round(),
        is_over_budget: spent > budget,
        status,
    }
}
