//! The JSON endpoint that serves the analytics snapshot.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    analytics::{AnalyticsOptions, AnalyticsSnapshot, CategoryFilter, compute_analytics},
    budget::{BudgetPeriod, budget_limits, get_budgets},
    timezone::local_today,
    transaction::{TransactionOrder, list_transactions},
};

/// The state needed for computing analytics.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The database connection for reading transactions and budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters for the analytics endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// The year for the monthly series, defaults to the current year.
    pub year: Option<i32>,
    /// One of "all", "income" or "expense", defaults to "all".
    pub filter: Option<String>,
}

impl AnalyticsQuery {
    /// Resolve the query into engine options for `today`.
    ///
    /// # Errors
    /// Returns [Error::InvalidCategoryFilter] if `filter` is not recognised.
    pub fn into_options(self, today: time::Date) -> Result<AnalyticsOptions, Error> {
        let filter = match self.filter.as_deref() {
            Some(filter) if !filter.is_empty() => filter.parse()?,
            _ => CategoryFilter::All,
        };

        Ok(AnalyticsOptions {
            filter,
            today,
            year: self.year.unwrap_or(today.year()),
        })
    }
}

/// A route handler that computes analytics over every transaction and the
/// current month's budgets.
pub async fn get_analytics_endpoint(
    State(state): State<AnalyticsState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Result<Json<AnalyticsSnapshot>, Error> {
    let Query(query) = query?;
    let today = local_today(&state.local_timezone)?;
    let options = query.into_options(today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = list_transactions(TransactionOrder::NewestDate, None, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
    let budgets = get_budgets(BudgetPeriod::containing(today), &connection)
        .inspect_err(|error| tracing::error!("could not get budgets: {error}"))?;

    Ok(Json(compute_analytics(
        &transactions,
        &budget_limits(&budgets),
        &options,
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Query, State},
    };
    use time::OffsetDateTime;

    use crate::{
        Error,
        analytics::{AnalyticsQuery, AnalyticsState, CategoryFilter, get_analytics_endpoint},
        budget::{BudgetPeriod, upsert_budget},
        test_utils::get_test_connection,
        transaction::{Transaction, TransactionType, create_transaction},
    };

    fn get_test_state() -> AnalyticsState {
        AnalyticsState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    #[tokio::test]
    async fn computes_snapshot_from_store() {
        let state = get_test_state();
        let today = OffsetDateTime::now_utc().date();
        {
            let connection = state.db_connection.lock().unwrap();
            let lunch = Transaction::build(40.0, today, "Lunch", TransactionType::Expense)
                .category(Some("food".to_owned()))
                .validate()
                .unwrap();
            let pay = Transaction::build(200.0, today, "Pay", TransactionType::Income)
                .validate()
                .unwrap();
            create_transaction(&lunch, &connection).unwrap();
            create_transaction(&pay, &connection).unwrap();
            upsert_budget("food", 50.0, BudgetPeriod::containing(today), &connection).unwrap();
        }

        let Json(snapshot) = get_analytics_endpoint(State(state), Ok(Query(AnalyticsQuery::default())))
            .await
            .unwrap();

        assert_eq!(snapshot.total_income, 200.0);
        assert_eq!(snapshot.total_expenses, 40.0);
        assert_eq!(snapshot.monthly_expenses, 40.0);
        assert_eq!(snapshot.transaction_count, 2);
        assert_eq!(snapshot.budget_analysis.len(), 1);
        assert_eq!(snapshot.budget_analysis[0].percentage_used, 80.0);
    }

    #[tokio::test]
    async fn rejects_unknown_filter() {
        let query = AnalyticsQuery {
            year: None,
            filter: Some("savings".to_owned()),
        };

        let result = get_analytics_endpoint(State(get_test_state()), Ok(Query(query))).await;

        assert!(
            matches!(result, Err(Error::InvalidCategoryFilter(ref filter)) if filter == "savings"),
            "got {result:?}"
        );
    }

    #[test]
    fn query_defaults_to_all_and_current_year() {
        let today = time::macros::date!(2025 - 06 - 01);

        let options = AnalyticsQuery::default().into_options(today).unwrap();

        assert_eq!(options.filter, CategoryFilter::All);
        assert_eq!(options.year, 2025);
        assert_eq!(options.today, today);
    }
}
