//! Derives the dashboard analytics snapshot from transactions and budgets.

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{
    Error,
    analytics::budget_status::{BudgetStatus, budget_status},
    category::resolve_category_name,
    transaction::{Transaction, TransactionType},
};

/// The number of categories in [AnalyticsSnapshot::top_categories].
pub const TOP_CATEGORY_LIMIT: usize = 3;
/// The number of transactions in [AnalyticsSnapshot::recent_transactions].
pub const RECENT_TRANSACTION_LIMIT: usize = 5;

/// Budget limits keyed by category display name.
pub type Budgets = BTreeMap<String, f64>;

/// Which transaction types contribute to the per-category totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    /// Both income and expense categories.
    #[default]
    All,
    /// Income categories only.
    Income,
    /// Expense categories only.
    Expense,
}

impl CategoryFilter {
    fn includes(&self, transaction_type: TransactionType) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Income => transaction_type == TransactionType::Income,
            CategoryFilter::Expense => transaction_type == TransactionType::Expense,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(CategoryFilter::All),
            "income" => Ok(CategoryFilter::Income),
            "expense" => Ok(CategoryFilter::Expense),
            other => Err(Error::InvalidCategoryFilter(other.to_owned())),
        }
    }
}

/// The inputs to [compute_analytics] other than the data itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsOptions {
    /// Which transaction types count towards the category totals.
    pub filter: CategoryFilter,
    /// The current date. Its month is the "current month" for budgets.
    pub today: Date,
    /// The year covered by the monthly series.
    pub year: i32,
}

impl AnalyticsOptions {
    /// Options for the current year with no category filter.
    pub fn for_today(today: Date) -> Self {
        Self {
            filter: CategoryFilter::All,
            today,
            year: today.year(),
        }
    }
}

/// A category name and an amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// The category display name.
    pub category: String,
    /// The summed amount.
    pub amount: f64,
}

/// The expenses for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// The month number, 1 to 12.
    pub month: u8,
    /// The three-letter month name, e.g. "Mar".
    pub label: String,
    /// The summed expenses for the month.
    pub amount: f64,
}

/// Aggregate values derived from the transaction log. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    /// The sum of all income.
    pub total_income: f64,
    /// The sum of all expenses.
    pub total_expenses: f64,
    /// `total_income - total_expenses`.
    pub net_balance: f64,
    /// The share of income not spent, as a percentage. Zero without income.
    pub savings_rate: f64,
    /// Income dated in the current month.
    pub monthly_income: f64,
    /// Expenses dated in the current month.
    pub monthly_expenses: f64,
    /// Amounts per category display name, restricted by the category filter.
    pub category_totals: BTreeMap<String, f64>,
    /// Current month expenses per category display name.
    pub monthly_spending: BTreeMap<String, f64>,
    /// The largest entries of `category_totals`.
    pub top_categories: Vec<CategoryTotal>,
    /// Budget status per budgeted category, most used first.
    pub budget_analysis: Vec<BudgetStatus>,
    /// The sum of all budget limits.
    pub total_budget: f64,
    /// All expenses in the current month, budgeted or not.
    pub total_spent: f64,
    /// `total_spent` as a percentage of `total_budget`. Zero without budgets.
    pub budget_utilization: f64,
    /// Expenses for each month of the requested year, January first.
    pub monthly_series: Vec<MonthlyTotal>,
    /// The newest transactions by date.
    pub recent_transactions: Vec<Transaction>,
    /// The number of transactions the snapshot was derived from.
    pub transaction_count: usize,
}

/// Derive the analytics snapshot for `transactions` and `budgets`.
///
/// This function does no I/O and handles an empty transaction list by
/// returning zeros everywhere.
pub fn compute_analytics(
    transactions: &[Transaction],
    budgets: &Budgets,
    options: &AnalyticsOptions,
) -> AnalyticsSnapshot {
    let mut total_income = 0.0;
    let mut total_expenses = 0.0;
    let mut monthly_income = 0.0;
    let mut monthly_expenses = 0.0;
    let mut category_totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut monthly_spending: BTreeMap<String, f64> = BTreeMap::new();
    let mut monthly_series = [0.0; 12];

    for transaction in transactions {
        let amount = transaction.amount.abs();
        let is_current_month = is_same_month(transaction.date, options.today);

        match transaction.transaction_type {
            TransactionType::Income => {
                total_income += amount;

                if is_current_month {
                    monthly_income += amount;
                }
            }
            TransactionType::Expense => {
                total_expenses += amount;

                if transaction.date.year() == options.year {
                    monthly_series[month_index(transaction.date.month())] += amount;
                }

                if is_current_month {
                    monthly_expenses += amount;
                    *monthly_spending
                        .entry(category_name(transaction))
                        .or_insert(0.0) += amount;
                }
            }
        }

        if options.filter.includes(transaction.transaction_type) {
            *category_totals
                .entry(category_name(transaction))
                .or_insert(0.0) += amount;
        }
    }

    let savings_rate = if total_income > 0.0 {
        (total_income - total_expenses) / total_income * 100.0
    } else {
        0.0
    };

    let mut budget_analysis: Vec<BudgetStatus> = budgets
        .iter()
        .map(|(category, &budget)| {
            let spent = monthly_spending.get(category).copied().unwrap_or(0.0);
            budget_status(category, budget, spent)
        })
        .collect();
    budget_analysis.sort_by(|a, b| {
        b.percentage_used
            .total_cmp(&a.percentage_used)
            .then_with(|| a.category.cmp(&b.category))
    });

    let total_budget: f64 = budgets.values().sum();
    let total_spent = monthly_expenses;
    let budget_utilization = if total_budget > 0.0 {
        total_spent / total_budget * 100.0
    } else {
        0.0
    };

    AnalyticsSnapshot {
        total_income,
        total_expenses,
        net_balance: total_income - total_expenses,
        savings_rate,
        monthly_income,
        monthly_expenses,
        top_categories: top_categories(&category_totals, TOP_CATEGORY_LIMIT),
        category_totals,
        monthly_spending,
        budget_analysis,
        total_budget,
        total_spent,
        budget_utilization,
        monthly_series: build_monthly_series(monthly_series),
        recent_transactions: recent_transactions(transactions, RECENT_TRANSACTION_LIMIT),
        transaction_count: transactions.len(),
    }
}

/// The `limit` largest non-zero totals, largest first.
pub fn top_categories(totals: &BTreeMap<String, f64>, limit: usize) -> Vec<CategoryTotal> {
    let mut entries: Vec<CategoryTotal> = totals
        .iter()
        .filter(|&(_, &amount)| amount > 0.0)
        .map(|(category, &amount)| CategoryTotal {
            category: category.clone(),
            amount,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    entries.truncate(limit);

    entries
}

fn category_name(transaction: &Transaction) -> String {
    resolve_category_name(&transaction.category, transaction.transaction_type)
}

fn is_same_month(date: Date, other: Date) -> bool {
    date.year() == other.year() && date.month() == other.month()
}

fn month_index(month: Month) -> usize {
    u8::from(month) as usize - 1
}

fn build_monthly_series(totals: [f64; 12]) -> Vec<MonthlyTotal> {
    let mut month = Month::January;

    totals
        .into_iter()
        .map(|amount| {
            let total = MonthlyTotal {
                month: u8::from(month),
                label: month_label(month).to_owned(),
                amount,
            };
            month = month.next();
            total
        })
        .collect()
}

/// The three-letter abbreviation for `month`.
pub(crate) fn month_label(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut recent: Vec<&Transaction> = transactions.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

    recent.into_iter().take(limit).cloned().collect()
}
