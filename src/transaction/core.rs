//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, category::default_category_for_type, database_id::TransactionId};

/// The maximum number of graphemes allowed in a transaction description.
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in, e.g. a salary payment.
    Income,
    /// Money going out, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// The lowercase name used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned in this transaction. Always positive.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The ID of the category the transaction belongs to, e.g. "food".
    pub category: String,
    /// When the transaction was first recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: f64,
        date: Date,
        description: &str,
        transaction_type: TransactionType,
    ) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            description: description.to_owned(),
            transaction_type,
            category: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Call [TransactionBuilder::validate] to check the fields and fill in the
/// default category before handing the transaction to the database.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::transaction::{Transaction, TransactionType};
///
/// let transaction = Transaction::build(
///         45.99,
///         date!(2025-01-15),
///         "Coffee shop purchase",
///         TransactionType::Expense,
///     )
///     .category(Some("food".to_owned()))
///     .validate()
///     .unwrap();
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction, must be greater than zero.
    ///
    /// The direction of the money is given by `transaction_type`, not the sign.
    pub amount: f64,

    /// The date when the transaction occurred.
    ///
    /// This is the date the user assigns to the transaction, which may differ
    /// from when it was recorded.
    pub date: Date,

    /// A human-readable description of the transaction.
    ///
    /// Leading and trailing whitespace is removed. Must not be empty and must
    /// be at most [MAX_DESCRIPTION_LENGTH] graphemes long.
    pub description: String,

    /// Whether this transaction is income or an expense.
    pub transaction_type: TransactionType,

    /// The category ID, e.g. "food".
    ///
    /// `None` or a blank string is replaced with the default category for
    /// `transaction_type` during validation.
    pub category: Option<String>,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Check the fields and resolve the category.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if the amount is not a finite number greater than zero,
    /// - [Error::EmptyDescription] if the description is empty or only whitespace,
    /// - or [Error::DescriptionTooLong] if the description is longer than [MAX_DESCRIPTION_LENGTH].
    pub fn validate(self) -> Result<ValidatedTransaction, Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount));
        }

        let description = self.description.trim();

        if description.is_empty() {
            return Err(Error::EmptyDescription);
        }

        let description_length = description.graphemes(true).count();
        if description_length > MAX_DESCRIPTION_LENGTH {
            return Err(Error::DescriptionTooLong(description_length));
        }

        let category = match self.category.as_deref().map(str::trim) {
            Some(category) if !category.is_empty() => category.to_owned(),
            _ => default_category_for_type(self.transaction_type).id.to_owned(),
        };

        Ok(ValidatedTransaction {
            amount: self.amount,
            date: self.date,
            description: description.to_owned(),
            transaction_type: self.transaction_type,
            category,
        })
    }
}

/// The fields of a transaction that have passed validation and have a
/// resolved category.
///
/// This is the only input the database functions accept for writes.
#[derive(Debug, PartialEq, Clone)]
pub struct ValidatedTransaction {
    amount: f64,
    date: Date,
    description: String,
    transaction_type: TransactionType,
    category: String,
}

impl ValidatedTransaction {
    /// The category ID that will be stored.
    pub fn category(&self) -> &str {
        &self.category
    }
}

/// The sort order for listing transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOrder {
    /// Most recently recorded first.
    NewestCreated,
    /// Newest transaction date first.
    NewestDate,
}

/// The transactions included in [aggregate_sums].
#[derive(Debug, Clone, PartialEq)]
pub struct SumFilter {
    /// Only sum transactions of this type.
    pub transaction_type: TransactionType,
    /// Only sum transactions dated within this range, if given.
    pub date_range: Option<RangeInclusive<Date>>,
}

/// How [aggregate_sums] groups the matching transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumGroup {
    /// Group by the stored category ID.
    Category,
    /// Group by calendar month, keyed "01" to "12".
    Month,
}

/// The total of one group from [aggregate_sums].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSum {
    /// The category ID or two-digit month.
    pub key: String,
    /// The sum of the transaction amounts in the group.
    pub total: f64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn create_transaction(
    transaction: &ValidatedTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = OffsetDateTime::now_utc();

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (amount, description, date, type, category, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING id, amount, description, date, type, category, created_at, updated_at",
        )?
        .query_row(
            (
                transaction.amount,
                &transaction.description,
                transaction.date,
                transaction.transaction_type,
                &transaction.category,
                now,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, amount, description, date, type, category, created_at, updated_at
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Replace the fields of the transaction `id`, keeping its creation time.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    transaction: &ValidatedTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "UPDATE \"transaction\"
             SET amount = ?1, description = ?2, date = ?3, type = ?4, category = ?5, updated_at = ?6
             WHERE id = ?7
             RETURNING id, amount, description, date, type, category, created_at, updated_at",
        )?
        .query_row(
            (
                transaction.amount,
                &transaction.description,
                transaction.date,
                transaction.transaction_type,
                &transaction.category,
                OffsetDateTime::now_utc(),
                id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete the transaction `id` and return the row that was removed.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "DELETE FROM \"transaction\" WHERE id = :id
             RETURNING id, amount, description, date, type, category, created_at, updated_at",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// List transactions in `order`, returning at most `limit` rows if given.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn list_transactions(
    order: TransactionOrder,
    limit: Option<u32>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let order_clause = match order {
        TransactionOrder::NewestCreated => "created_at DESC, id DESC",
        TransactionOrder::NewestDate => "date DESC, id DESC",
    };

    // SQLite treats a negative limit as no limit.
    let limit = limit.map(i64::from).unwrap_or(-1);

    connection
        .prepare(&format!(
            "SELECT id, amount, description, date, type, category, created_at, updated_at
             FROM \"transaction\"
             ORDER BY {order_clause}
             LIMIT ?1"
        ))?
        .query_map([limit], map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Sum the amounts of the transactions matching `filter`, grouped by `group`.
///
/// Groups are returned in ascending key order. Groups with no transactions
/// are omitted.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn aggregate_sums(
    filter: &SumFilter,
    group: SumGroup,
    connection: &Connection,
) -> Result<Vec<GroupSum>, Error> {
    let group_key = match group {
        SumGroup::Category => "category",
        SumGroup::Month => "strftime('%m', date)",
    };

    let (start, end) = match &filter.date_range {
        Some(range) => (Some(*range.start()), Some(*range.end())),
        None => (None, None),
    };

    connection
        .prepare(&format!(
            "SELECT {group_key} AS group_key, SUM(amount)
             FROM \"transaction\"
             WHERE type = ?1
                AND (?2 IS NULL OR date >= ?2)
                AND (?3 IS NULL OR date <= ?3)
             GROUP BY group_key
             ORDER BY group_key"
        ))?
        .query_map((filter.transaction_type, start, end), |row| {
            Ok(GroupSum {
                key: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL CHECK (amount > 0),
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                category TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    // Used by the budget spending and monthly series queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_type_date ON \"transaction\"(type, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        description: row.get(2)?,
        date: row.get(3)?,
        transaction_type: row.get(4)?,
        category: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use time::macros::date;

    use crate::{
        Error,
        test_utils::get_test_connection,
        transaction::{
            SumFilter, SumGroup, Transaction, TransactionOrder, TransactionType,
            aggregate_sums, count_transactions, create_transaction, delete_transaction,
            get_transaction, list_transactions, update_transaction,
        },
    };

    fn expense(amount: f64, date: time::Date, category: &str) -> super::ValidatedTransaction {
        Transaction::build(amount, date, "test", TransactionType::Expense)
            .category(Some(category.to_owned()))
            .validate()
            .unwrap()
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();

        let transaction = create_transaction(&expense(12.3, date!(2025 - 10 - 05), "food"), &conn)
            .expect("Could not create transaction");

        assert_eq!(transaction.amount, 12.3);
        assert_eq!(transaction.category, "food");
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
        assert_eq!(transaction.created_at, transaction.updated_at);
        assert_eq!(get_transaction(transaction.id, &conn), Ok(transaction));
    }

    #[test]
    fn get_missing_returns_not_found() {
        let conn = get_test_connection();

        assert_eq!(get_transaction(42, &conn), Err(Error::NotFound));
    }

    #[test]
    fn update_replaces_fields() {
        let conn = get_test_connection();
        let original =
            create_transaction(&expense(12.3, date!(2025 - 10 - 05), "food"), &conn).unwrap();
        let replacement = Transaction::build(
            99.0,
            date!(2025 - 10 - 06),
            "Paycheck",
            TransactionType::Income,
        )
        .validate()
        .unwrap();

        let updated = update_transaction(original.id, &replacement, &conn).unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.amount, 99.0);
        assert_eq!(updated.description, "Paycheck");
        assert_eq!(updated.date, date!(2025 - 10 - 06));
        assert_eq!(updated.transaction_type, TransactionType::Income);
        assert_eq!(updated.category, "salary");
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);
    }

    #[test]
    fn update_missing_returns_not_found() {
        let conn = get_test_connection();

        let result = update_transaction(7, &expense(1.0, date!(2025 - 10 - 05), "food"), &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_returns_removed_row() {
        let conn = get_test_connection();
        let transaction =
            create_transaction(&expense(1.23, date!(2025 - 10 - 26), "food"), &conn).unwrap();

        let removed = delete_transaction(transaction.id, &conn).unwrap();

        assert_eq!(removed, transaction);
        assert_eq!(get_transaction(transaction.id, &conn), Err(Error::NotFound));
        assert_eq!(delete_transaction(transaction.id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn list_orders_and_limits() {
        let conn = get_test_connection();
        let older = create_transaction(&expense(1.0, date!(2025 - 01 - 01), "food"), &conn).unwrap();
        let newer = create_transaction(&expense(2.0, date!(2025 - 02 - 01), "food"), &conn).unwrap();
        let oldest = create_transaction(&expense(3.0, date!(2024 - 12 - 01), "food"), &conn).unwrap();

        let by_date = list_transactions(TransactionOrder::NewestDate, None, &conn).unwrap();
        assert_eq!(by_date, vec![newer.clone(), older.clone(), oldest.clone()]);

        let by_created = list_transactions(TransactionOrder::NewestCreated, Some(2), &conn).unwrap();
        assert_eq!(by_created.len(), 2);
        assert_eq!(by_created[0], oldest);
    }

    #[test]
    fn get_count() {
        let conn = get_test_connection();
        let want_count = 20;
        for i in 1..=want_count {
            create_transaction(&expense(i as f64, date!(2025 - 10 - 05), "food"), &conn)
                .expect("Could not create transaction");
        }

        let got_count = count_transactions(&conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }

    #[test]
    fn aggregates_by_category_within_range() {
        let conn = get_test_connection();
        create_transaction(&expense(60.0, date!(2024 - 03 - 01), "food"), &conn).unwrap();
        create_transaction(&expense(50.0, date!(2024 - 03 - 31), "food"), &conn).unwrap();
        create_transaction(&expense(20.0, date!(2024 - 03 - 15), "travel"), &conn).unwrap();
        create_transaction(&expense(999.0, date!(2024 - 04 - 01), "food"), &conn).unwrap();
        create_transaction(
            &Transaction::build(500.0, date!(2024 - 03 - 10), "Pay", TransactionType::Income)
                .validate()
                .unwrap(),
            &conn,
        )
        .unwrap();

        let sums = aggregate_sums(
            &SumFilter {
                transaction_type: TransactionType::Expense,
                date_range: Some(date!(2024 - 03 - 01)..=date!(2024 - 03 - 31)),
            },
            SumGroup::Category,
            &conn,
        )
        .unwrap();

        let sums: Vec<_> = sums.iter().map(|sum| (sum.key.as_str(), sum.total)).collect();
        assert_eq!(sums, vec![("food", 110.0), ("travel", 20.0)]);
    }

    #[test]
    fn aggregates_by_month() {
        let conn = get_test_connection();
        create_transaction(&expense(10.0, date!(2024 - 01 - 05), "food"), &conn).unwrap();
        create_transaction(&expense(15.0, date!(2024 - 01 - 25), "bills"), &conn).unwrap();
        create_transaction(&expense(7.5, date!(2024 - 11 - 02), "food"), &conn).unwrap();

        let sums = aggregate_sums(
            &SumFilter {
                transaction_type: TransactionType::Expense,
                date_range: None,
            },
            SumGroup::Month,
            &conn,
        )
        .unwrap();

        let sums: Vec<_> = sums.iter().map(|sum| (sum.key.as_str(), sum.total)).collect();
        assert_eq!(sums, vec![("01", 25.0), ("11", 7.5)]);
    }
}
