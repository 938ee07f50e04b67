//! The fixed category taxonomy used to label transactions and budgets.
//!
//! Categories are not stored in the database. Transactions refer to a category
//! by its ID (e.g. "food"), and the dashboard and budgets use the display name
//! (e.g. "Food & Dining").

use axum::{
    Json,
    extract::{Query, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};

use crate::{Error, transaction::TransactionType};

/// Display metadata for a category of income or expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    /// The identifier stored on transactions, e.g. "food".
    pub id: &'static str,
    /// The human readable name, e.g. "Food & Dining".
    pub name: &'static str,
    /// Whether the category applies to income or expenses.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// A hex colour used when charting the category.
    pub color: &'static str,
    /// A short description of what belongs in the category.
    pub description: &'static str,
}

const fn category(
    id: &'static str,
    name: &'static str,
    transaction_type: TransactionType,
    color: &'static str,
    description: &'static str,
) -> Category {
    Category {
        id,
        name,
        transaction_type,
        color,
        description,
    }
}

/// Every category, income first. The first category of each type is the
/// default for that type.
pub const CATEGORIES: [Category; 15] = [
    category(
        "salary",
        "Salary",
        TransactionType::Income,
        "#10b981",
        "Monthly salary and wages",
    ),
    category(
        "freelance",
        "Freelance",
        TransactionType::Income,
        "#059669",
        "Freelance and contract work",
    ),
    category(
        "investment",
        "Investment",
        TransactionType::Income,
        "#047857",
        "Dividends, interest, and investment returns",
    ),
    category(
        "bonus",
        "Bonus",
        TransactionType::Income,
        "#064e3b",
        "Bonuses and incentives",
    ),
    category(
        "housing",
        "Housing",
        TransactionType::Expense,
        "#6366f1",
        "Rent, mortgage, utilities",
    ),
    category(
        "transportation",
        "Transportation",
        TransactionType::Expense,
        "#4f46e5",
        "Gas, public transport, car maintenance",
    ),
    category(
        "food",
        "Food & Dining",
        TransactionType::Expense,
        "#4338ca",
        "Groceries, restaurants, food delivery",
    ),
    category(
        "entertainment",
        "Entertainment",
        TransactionType::Expense,
        "#3730a3",
        "Movies, games, streaming services",
    ),
    category(
        "shopping",
        "Shopping",
        TransactionType::Expense,
        "#312e81",
        "Clothing, electronics, general shopping",
    ),
    category(
        "healthcare",
        "Healthcare",
        TransactionType::Expense,
        "#ef4444",
        "Medical expenses, insurance, pharmacy",
    ),
    category(
        "education",
        "Education",
        TransactionType::Expense,
        "#dc2626",
        "Courses, books, training",
    ),
    category(
        "travel",
        "Travel",
        TransactionType::Expense,
        "#b91c1c",
        "Vacation, business travel, accommodation",
    ),
    category(
        "gifts",
        "Gifts & Donations",
        TransactionType::Expense,
        "#991b1b",
        "Gifts, charity, donations",
    ),
    category(
        "maintenance",
        "Maintenance",
        TransactionType::Expense,
        "#7f1d1d",
        "Home repairs, car service, maintenance",
    ),
    category(
        "bills",
        "Bills & Services",
        TransactionType::Expense,
        "#f59e0b",
        "Phone, internet, subscriptions",
    ),
];

/// Look up a category by its ID.
pub fn get_category_by_id(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|category| category.id == id)
}

/// Look up a category by its display name.
pub fn get_category_by_name(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|category| category.name == name)
}

/// All categories for `transaction_type`, in taxonomy order.
pub fn list_categories_by_type(
    transaction_type: TransactionType,
) -> impl Iterator<Item = &'static Category> {
    CATEGORIES
        .iter()
        .filter(move |category| category.transaction_type == transaction_type)
}

/// The category assigned to a transaction of `transaction_type` that does
/// not specify one.
pub fn default_category_for_type(transaction_type: TransactionType) -> &'static Category {
    list_categories_by_type(transaction_type)
        .next()
        .unwrap_or(&CATEGORIES[0])
}

/// Resolve the name shown for a transaction's category.
///
/// Known IDs map to their display name, unknown IDs are shown as is, and
/// missing categories fall back to "Uncategorized" for expenses or "Income"
/// for income.
pub fn resolve_category_name(category_id: &str, transaction_type: TransactionType) -> String {
    if let Some(category) = get_category_by_id(category_id) {
        return category.name.to_owned();
    }

    let category_id = category_id.trim();

    if !category_id.is_empty() {
        return category_id.to_owned();
    }

    match transaction_type {
        TransactionType::Expense => UNCATEGORIZED_LABEL.to_owned(),
        TransactionType::Income => INCOME_LABEL.to_owned(),
    }
}

/// The name used for expenses that have no category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";
/// The name used for income that has no category.
pub const INCOME_LABEL: &str = "Income";

/// The query parameters for listing categories.
#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    /// Only list categories of this type, if given.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
}

/// A route handler that lists the category taxonomy.
pub async fn list_categories_endpoint(
    query: Result<Query<CategoryQuery>, QueryRejection>,
) -> Result<Json<Vec<Category>>, Error> {
    let Query(query) = query?;

    let categories = match query.transaction_type {
        Some(transaction_type) => list_categories_by_type(transaction_type).copied().collect(),
        None => CATEGORIES.to_vec(),
    };

    Ok(Json(categories))
}
