//! Defines the budget model, budget periods and the budget database queries.

use std::{collections::BTreeMap, ops::RangeInclusive};

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    analytics::{BudgetHealth, Budgets, budget_status},
    category::{get_category_by_id, resolve_category_name},
    database_id::BudgetId,
    transaction::{SumFilter, SumGroup, TransactionType, aggregate_sums},
};

/// The earliest year a budget can be set for.
pub const MIN_BUDGET_YEAR: i32 = 2020;

// ============================================================================
// MODELS
// ============================================================================

/// A calendar month that budgets apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BudgetPeriod {
    month: u8,
    year: i32,
}

impl BudgetPeriod {
    /// Create a budget period.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidMonth] if `month` is not between 1 and 12,
    /// - or [Error::InvalidYear] if `year` is before [MIN_BUDGET_YEAR].
    pub fn new(month: u8, year: i32) -> Result<Self, Error> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidMonth(month));
        }

        if year < MIN_BUDGET_YEAR {
            return Err(Error::InvalidYear(year));
        }

        Ok(Self { month, year })
    }

    /// The period that `date` falls in.
    ///
    /// Dates before [MIN_BUDGET_YEAR] are not rejected here since "today" is
    /// always a valid period to display.
    pub fn containing(date: Date) -> Self {
        Self {
            month: u8::from(date.month()),
            year: date.year(),
        }
    }

    /// Resolve a period from optional query parameters, defaulting each
    /// missing part to the period containing `today`.
    ///
    /// # Errors
    /// Returns the same errors as [BudgetPeriod::new].
    pub fn from_parts(month: Option<u8>, year: Option<i32>, today: Date) -> Result<Self, Error> {
        let current = Self::containing(today);

        Self::new(
            month.unwrap_or(current.month),
            year.unwrap_or(current.year),
        )
    }

    /// The month number, 1 to 12.
    pub fn month(&self) -> u8 {
        self.month
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The first to last day of the period, inclusive.
    pub fn date_range(&self) -> RangeInclusive<Date> {
        // The month is checked on construction.
        let month = Month::try_from(self.month).unwrap_or(Month::January);
        let first = Date::from_calendar_date(self.year, month, 1).unwrap_or(Date::MIN);
        let last_day = time::util::days_in_year_month(self.year, month);
        let last = Date::from_calendar_date(self.year, month, last_day).unwrap_or(Date::MAX);

        first..=last
    }
}

/// A spending limit for one category in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The category display name the budget applies to, e.g. "Food & Dining".
    pub category_name: String,
    /// The spending limit. Always positive, a zero budget is not stored.
    pub amount: f64,
    /// The month number, 1 to 12.
    pub month: u8,
    /// The calendar year.
    pub year: i32,
    /// When the budget was first set.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the budget was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A budget along with how much of it has been spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetWithSpending {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The category display name the budget applies to.
    pub category_name: String,
    /// The spending limit.
    pub amount: f64,
    /// The month number, 1 to 12.
    pub month: u8,
    /// The calendar year.
    pub year: i32,
    /// The expenses in the budget's category and month.
    pub spent: f64,
    /// How much can still be spent, never negative.
    pub remaining: f64,
    /// `spent` as a whole percentage of `amount`.
    pub percentage_used: f64,
    /// Whether more than `amount` has been spent.
    pub is_over_budget: bool,
    /// The traffic light classification of the budget.
    pub status: BudgetHealth,
}

/// The counts of rows changed by [bulk_upsert_or_delete].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkBudgetResult {
    /// Budgets that did not exist before.
    pub upserted: usize,
    /// Existing budgets whose amount was replaced.
    pub modified: usize,
    /// Budgets removed because their new amount was zero.
    pub deleted: usize,
    /// `upserted + modified`.
    pub total_updated: usize,
    /// Same as `deleted`.
    pub total_deleted: usize,
}

/// Normalise a category name given by a client.
///
/// Category IDs from the taxonomy, e.g. "food", are replaced with their
/// display name so that budgets line up with the analytics category totals.
///
/// # Errors
/// Returns [Error::EmptyCategoryName] if `name` is empty or only whitespace.
pub fn normalize_category_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyCategoryName);
    }

    match get_category_by_id(name) {
        Some(category) => Ok(category.name.to_owned()),
        None => Ok(name.to_owned()),
    }
}

/// Collect budgets into the name to amount mapping used by the analytics engine.
pub fn budget_limits(budgets: &[Budget]) -> Budgets {
    budgets
        .iter()
        .map(|budget| (budget.category_name.clone(), budget.amount))
        .collect()
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const BUDGET_COLUMNS: &str = "id, category_name, amount, month, year, created_at, updated_at";

/// Get the budgets for `period`, ordered by category name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_budgets(period: BudgetPeriod, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget
             WHERE month = ?1 AND year = ?2
             ORDER BY category_name"
        ))?
        .query_map((period.month, period.year), map_budget_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Create a budget, failing if one already exists for the category and period.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `amount` is not a finite number greater than zero,
/// - [Error::EmptyCategoryName] if `category_name` is blank,
/// - [Error::DuplicateBudget] if the category already has a budget for `period`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    category_name: &str,
    amount: f64,
    period: BudgetPeriod,
    connection: &Connection,
) -> Result<Budget, Error> {
    validate_positive_amount(amount)?;
    let category_name = normalize_category_name(category_name)?;
    let now = OffsetDateTime::now_utc();

    let result = connection
        .prepare(&format!(
            "INSERT INTO budget (category_name, amount, month, year, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (&category_name, amount, period.month, period.year, now),
            map_budget_row,
        );

    match result {
        Ok(budget) => Ok(budget),
        // Code 2067 occurs when a UNIQUE constraint failed.
        Err(rusqlite::Error::SqliteFailure(sql_error, _)) if sql_error.extended_code == 2067 => {
            Err(Error::DuplicateBudget {
                category_name,
                month: period.month,
                year: period.year,
            })
        }
        Err(error) => Err(error.into()),
    }
}

/// Set the budget for a category and period, replacing any existing amount.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `amount` is not a finite number greater than zero,
/// - [Error::EmptyCategoryName] if `category_name` is blank,
/// - or [Error::SqlError] if there is some SQL error.
pub fn upsert_budget(
    category_name: &str,
    amount: f64,
    period: BudgetPeriod,
    connection: &Connection,
) -> Result<Budget, Error> {
    validate_positive_amount(amount)?;
    let category_name = normalize_category_name(category_name)?;

    upsert_normalized(&category_name, amount, period, connection)
}

/// Apply a batch of budget amounts for `period` in a single SQL transaction.
///
/// An amount of zero removes the category's budget, a positive amount sets it.
/// Either every entry is applied or none are.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeBudgetAmount] if any amount is negative or not finite,
/// - [Error::EmptyCategoryName] if any category name is blank,
/// - [Error::DuplicateCategoryName] if two entries name the same category,
///   e.g. "food" and "Food & Dining",
/// - or [Error::SqlError] if there is some SQL error.
pub fn bulk_upsert_or_delete(
    period: BudgetPeriod,
    entries: &BTreeMap<String, f64>,
    connection: &Connection,
) -> Result<BulkBudgetResult, Error> {
    let mut normalized = Vec::with_capacity(entries.len());

    for (name, &amount) in entries {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::NegativeBudgetAmount {
                category_name: name.clone(),
                amount,
            });
        }

        let category_name = normalize_category_name(name)?;

        if normalized.iter().any(|(seen, _)| *seen == category_name) {
            return Err(Error::DuplicateCategoryName(category_name));
        }

        normalized.push((category_name, amount));
    }

    let sql_transaction = connection.unchecked_transaction()?;
    let mut result = BulkBudgetResult::default();

    for (category_name, amount) in normalized {
        let existing_id = find_budget_id(&category_name, period, &sql_transaction)?;

        if amount == 0.0 {
            if let Some(id) = existing_id {
                sql_transaction.execute("DELETE FROM budget WHERE id = ?1", [id])?;
                result.deleted += 1;
            }
            continue;
        }

        upsert_normalized(&category_name, amount, period, &sql_transaction)?;

        match existing_id {
            Some(_) => result.modified += 1,
            None => result.upserted += 1,
        }
    }

    sql_transaction.commit()?;

    result.total_updated = result.upserted + result.modified;
    result.total_deleted = result.deleted;

    Ok(result)
}

/// Delete the budget `id` and return the row that was removed.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid budget,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_budget(id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!(
            "DELETE FROM budget WHERE id = :id RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_one(&[(":id", &id)], map_budget_row)?;

    Ok(budget)
}

/// Get the budgets for `period` along with the expenses recorded against each.
///
/// Expenses are matched to a budget by their resolved category display name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_budgets_with_spending(
    period: BudgetPeriod,
    connection: &Connection,
) -> Result<Vec<BudgetWithSpending>, Error> {
    let budgets = get_budgets(period, connection)?;
    let sums = aggregate_sums(
        &SumFilter {
            transaction_type: TransactionType::Expense,
            date_range: Some(period.date_range()),
        },
        SumGroup::Category,
        connection,
    )?;

    let mut spending: BTreeMap<String, f64> = BTreeMap::new();
    for sum in sums {
        *spending
            .entry(resolve_category_name(&sum.key, TransactionType::Expense))
            .or_insert(0.0) += sum.total;
    }

    let budgets = budgets
        .into_iter()
        .map(|budget| {
            let spent = spending.get(&budget.category_name).copied().unwrap_or(0.0);
            let status = budget_status(&budget.category_name, budget.amount, spent);

            BudgetWithSpending {
                id: budget.id,
                category_name: budget.category_name,
                amount: budget.amount,
                month: budget.month,
                year: budget.year,
                spent,
                remaining: status.remaining,
                percentage_used: status.percentage_used,
                is_over_budget: status.is_over_budget,
                status: status.status,
            }
        })
        .collect();

    Ok(budgets)
}

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_name TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
                year INTEGER NOT NULL CHECK (year >= 2020),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(category_name, month, year)
                )",
        (),
    )?;

    Ok(())
}

fn validate_positive_amount(amount: f64) -> Result<(), Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    Ok(())
}

fn upsert_normalized(
    category_name: &str,
    amount: f64,
    period: BudgetPeriod,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!(
            "INSERT INTO budget (category_name, amount, month, year, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(category_name, month, year)
             DO UPDATE SET amount = excluded.amount, updated_at = excluded.updated_at
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                category_name,
                amount,
                period.month,
                period.year,
                OffsetDateTime::now_utc(),
            ),
            map_budget_row,
        )?;

    Ok(budget)
}

fn find_budget_id(
    category_name: &str,
    period: BudgetPeriod,
    connection: &Connection,
) -> Result<Option<BudgetId>, Error> {
    connection
        .query_row(
            "SELECT id FROM budget WHERE category_name = ?1 AND month = ?2 AND year = ?3",
            (category_name, period.month, period.year),
            |row| row.get(0),
        )
        .optional()
        .map_err(|error| error.into())
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        category_name: row.get(1)?,
        amount: row.get(2)?,
        month: row.get(3)?,
        year: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod period_tests {
    use time::macros::date;

    use crate::{Error, budget::BudgetPeriod};

    #[test]
    fn rejects_invalid_month() {
        assert_eq!(BudgetPeriod::new(0, 2024), Err(Error::InvalidMonth(0)));
        assert_eq!(BudgetPeriod::new(13, 2024), Err(Error::InvalidMonth(13)));
    }

    #[test]
    fn rejects_year_before_2020() {
        assert_eq!(BudgetPeriod::new(3, 2019), Err(Error::InvalidYear(2019)));
    }

    #[test]
    fn defaults_to_period_containing_today() {
        let today = date!(2024 - 03 - 15);

        let period = BudgetPeriod::from_parts(None, None, today).unwrap();
        let next = BudgetPeriod::from_parts(Some(4), None, today).unwrap();

        assert_eq!((period.month(), period.year()), (3, 2024));
        assert_eq!((next.month(), next.year()), (4, 2024));
    }

    #[test]
    fn date_range_covers_whole_month() {
        let february = BudgetPeriod::new(2, 2024).unwrap();

        assert_eq!(
            february.date_range(),
            date!(2024 - 02 - 01)..=date!(2024 - 02 - 29)
        );
    }
}

#[cfg(test)]
mod database_tests {
    use std::collections::BTreeMap;

    use time::macros::date;

    use crate::{
        Error,
        analytics::BudgetHealth,
        budget::{
            BudgetPeriod, BulkBudgetResult, bulk_upsert_or_delete, create_budget, delete_budget,
            get_budgets, get_budgets_with_spending, upsert_budget,
        },
        test_utils::get_test_connection,
        transaction::{Transaction, TransactionType, create_transaction},
    };

    fn march_2024() -> BudgetPeriod {
        BudgetPeriod::new(3, 2024).unwrap()
    }

    #[test]
    fn create_normalises_category_id() {
        let conn = get_test_connection();

        let budget = create_budget("food", 100.0, march_2024(), &conn).unwrap();

        assert_eq!(budget.category_name, "Food & Dining");
        assert_eq!(budget.amount, 100.0);
        assert_eq!((budget.month, budget.year), (3, 2024));
    }

    #[test]
    fn create_duplicate_returns_conflict() {
        let conn = get_test_connection();
        create_budget("Food & Dining", 100.0, march_2024(), &conn).unwrap();

        let result = create_budget("food", 50.0, march_2024(), &conn);

        assert_eq!(
            result,
            Err(Error::DuplicateBudget {
                category_name: "Food & Dining".to_owned(),
                month: 3,
                year: 2024,
            })
        );
    }

    #[test]
    fn create_rejects_zero_amount() {
        let conn = get_test_connection();

        let result = create_budget("food", 0.0, march_2024(), &conn);

        assert_eq!(result, Err(Error::InvalidAmount(0.0)));
    }

    #[test]
    fn upsert_replaces_amount() {
        let conn = get_test_connection();
        let original = upsert_budget("travel", 100.0, march_2024(), &conn).unwrap();

        let updated = upsert_budget("travel", 250.0, march_2024(), &conn).unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.amount, 250.0);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(get_budgets(march_2024(), &conn).unwrap(), vec![updated]);
    }

    #[test]
    fn get_budgets_filters_by_period_and_orders_by_name() {
        let conn = get_test_connection();
        upsert_budget("travel", 1.0, march_2024(), &conn).unwrap();
        upsert_budget("bills", 2.0, march_2024(), &conn).unwrap();
        upsert_budget("food", 3.0, BudgetPeriod::new(4, 2024).unwrap(), &conn).unwrap();

        let names: Vec<_> = get_budgets(march_2024(), &conn)
            .unwrap()
            .into_iter()
            .map(|budget| budget.category_name)
            .collect();

        assert_eq!(names, ["Bills & Services", "Travel"]);
    }

    #[test]
    fn bulk_update_upserts_modifies_and_deletes() {
        let conn = get_test_connection();
        upsert_budget("food", 100.0, march_2024(), &conn).unwrap();
        upsert_budget("travel", 100.0, march_2024(), &conn).unwrap();
        let entries = BTreeMap::from([
            ("food".to_owned(), 150.0),
            ("Travel".to_owned(), 0.0),
            ("Pets".to_owned(), 40.0),
            ("education".to_owned(), 0.0),
        ]);

        let result = bulk_upsert_or_delete(march_2024(), &entries, &conn).unwrap();

        assert_eq!(
            result,
            BulkBudgetResult {
                upserted: 1,
                modified: 1,
                deleted: 1,
                total_updated: 2,
                total_deleted: 1,
            }
        );
        let budgets: Vec<_> = get_budgets(march_2024(), &conn)
            .unwrap()
            .into_iter()
            .map(|budget| (budget.category_name, budget.amount))
            .collect();
        assert_eq!(
            budgets,
            vec![("Food & Dining".to_owned(), 150.0), ("Pets".to_owned(), 40.0)]
        );
    }

    #[test]
    fn bulk_update_never_stores_zero_amounts() {
        let conn = get_test_connection();
        let entries = BTreeMap::from([("food".to_owned(), 0.0)]);

        bulk_upsert_or_delete(march_2024(), &entries, &conn).unwrap();

        assert!(get_budgets(march_2024(), &conn).unwrap().is_empty());
    }

    #[test]
    fn bulk_update_with_negative_amount_changes_nothing() {
        let conn = get_test_connection();
        upsert_budget("food", 100.0, march_2024(), &conn).unwrap();
        let entries = BTreeMap::from([
            ("Food & Dining".to_owned(), 0.0),
            ("travel".to_owned(), -5.0),
        ]);

        let result = bulk_upsert_or_delete(march_2024(), &entries, &conn);

        assert_eq!(
            result,
            Err(Error::NegativeBudgetAmount {
                category_name: "travel".to_owned(),
                amount: -5.0,
            })
        );
        assert_eq!(get_budgets(march_2024(), &conn).unwrap().len(), 1);
    }

    #[test]
    fn bulk_update_rejects_id_and_name_for_the_same_category() {
        let conn = get_test_connection();
        upsert_budget("food", 100.0, march_2024(), &conn).unwrap();
        let entries = BTreeMap::from([
            ("food".to_owned(), 0.0),
            ("Food & Dining".to_owned(), 50.0),
        ]);

        let result = bulk_upsert_or_delete(march_2024(), &entries, &conn);

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("Food & Dining".to_owned()))
        );
        let budgets = get_budgets(march_2024(), &conn).unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].amount, 100.0);
    }

    #[test]
    fn delete_returns_removed_budget() {
        let conn = get_test_connection();
        let budget = upsert_budget("food", 100.0, march_2024(), &conn).unwrap();

        assert_eq!(delete_budget(budget.id, &conn), Ok(budget.clone()));
        assert_eq!(delete_budget(budget.id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn spending_is_matched_by_display_name() {
        let conn = get_test_connection();
        upsert_budget("food", 100.0, march_2024(), &conn).unwrap();
        upsert_budget("travel", 100.0, march_2024(), &conn).unwrap();
        for (amount, date) in [
            (60.0, date!(2024 - 03 - 01)),
            (50.0, date!(2024 - 03 - 31)),
            (70.0, date!(2024 - 04 - 01)),
        ] {
            let transaction = Transaction::build(amount, date, "Groceries", TransactionType::Expense)
                .category(Some("food".to_owned()))
                .validate()
                .unwrap();
            create_transaction(&transaction, &conn).unwrap();
        }

        let budgets = get_budgets_with_spending(march_2024(), &conn).unwrap();

        let food = &budgets[0];
        assert_eq!(food.category_name, "Food & Dining");
        assert_eq!(food.spent, 110.0);
        assert_eq!(food.remaining, 0.0);
        assert_eq!(food.percentage_used, 110.0);
        assert!(food.is_over_budget);
        assert_eq!(food.status, BudgetHealth::Over);

        let travel = &budgets[1];
        assert_eq!(travel.spent, 0.0);
        assert_eq!(travel.remaining, 100.0);
        assert_eq!(travel.status, BudgetHealth::Good);
    }
}
