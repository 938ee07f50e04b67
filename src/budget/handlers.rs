//! JSON route handlers for reading and changing monthly budgets.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{
        FromRef, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    budget::{
        Budget, BudgetPeriod, BudgetWithSpending, BulkBudgetResult, bulk_upsert_or_delete,
        create_budget, delete_budget, get_budgets_with_spending,
    },
    database_id::BudgetId,
    timezone::local_today,
};

/// The state needed by the budget handlers.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl BudgetState {
    fn period(&self, month: Option<u8>, year: Option<i32>) -> Result<BudgetPeriod, Error> {
        let today = local_today(&self.local_timezone)?;

        BudgetPeriod::from_parts(month, year, today)
    }
}

/// The query parameters selecting a budget month. Missing parts default to today.
#[derive(Debug, Default, Deserialize)]
pub struct BudgetQuery {
    /// The month number, 1 to 12.
    pub month: Option<u8>,
    /// The calendar year.
    pub year: Option<i32>,
}

/// The request body for creating a single budget.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetRequest {
    /// A category display name or taxonomy ID.
    #[serde(alias = "category")]
    pub category_name: String,
    /// The spending limit, must be greater than zero.
    pub amount: f64,
    /// The month number, defaults to the current month.
    pub month: Option<u8>,
    /// The calendar year, defaults to the current year.
    pub year: Option<i32>,
}

/// The request body for replacing many budgets at once.
#[derive(Debug, Deserialize)]
pub struct BulkBudgetRequest {
    /// The month number, defaults to the current month.
    pub month: Option<u8>,
    /// The calendar year, defaults to the current year.
    pub year: Option<i32>,
    /// Category name to amount. An amount of zero removes the budget.
    pub budgets: BTreeMap<String, f64>,
}

/// A route handler that lists a month's budgets with their spending.
pub async fn get_budgets_endpoint(
    State(state): State<BudgetState>,
    query: Result<Query<BudgetQuery>, QueryRejection>,
) -> Result<Json<Vec<BudgetWithSpending>>, Error> {
    let Query(query) = query?;
    let period = state.period(query.month, query.year)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_budgets_with_spending(period, &connection)
        .inspect_err(|error| tracing::error!("could not get budgets: {error}"))
        .map(Json)
}

/// A route handler for creating a budget, responds with 409 if the category
/// already has a budget for the month.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    body: Result<Json<CreateBudgetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Budget>), Error> {
    let Json(request) = body?;
    let period = state.period(request.month, request.year)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = create_budget(&request.category_name, request.amount, period, &connection)?;

    Ok((StatusCode::CREATED, Json(budget)))
}

/// A route handler that sets or removes many budgets for a month at once.
pub async fn bulk_update_budgets_endpoint(
    State(state): State<BudgetState>,
    body: Result<Json<BulkBudgetRequest>, JsonRejection>,
) -> Result<Json<BulkBudgetResult>, Error> {
    let Json(request) = body?;
    let period = state.period(request.month, request.year)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let result = bulk_upsert_or_delete(period, &request.budgets, &connection)?;
    tracing::info!(
        "updated {} and deleted {} budgets for {}-{:02}",
        result.total_updated,
        result.total_deleted,
        period.year(),
        period.month()
    );

    Ok(Json(result))
}

/// A route handler for deleting a budget, responds with the removed budget.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Json<Budget>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_budget(budget_id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        sync::{Arc, Mutex},
    };

    use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        routing::{delete, get},
    };
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        Error,
        budget::{
            BudgetPeriod, get_budgets, upsert_budget,
            handlers::{
                BudgetQuery, BudgetState, BulkBudgetRequest, bulk_update_budgets_endpoint,
                create_budget_endpoint, delete_budget_endpoint, get_budgets_endpoint,
            },
        },
        endpoints,
        test_utils::get_test_connection,
    };

    fn get_test_state() -> BudgetState {
        BudgetState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn get_test_server(state: BudgetState) -> TestServer {
        let app = Router::new()
            .route(
                endpoints::BUDGETS_API,
                get(get_budgets_endpoint)
                    .post(create_budget_endpoint)
                    .put(bulk_update_budgets_endpoint),
            )
            .route(endpoints::BUDGET, delete(delete_budget_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn create_then_conflict() {
        let server = get_test_server(get_test_state());
        let body = json!({"categoryName": "food", "amount": 100.0, "month": 3, "year": 2024});

        let created = server.post(endpoints::BUDGETS_API).json(&body).await;
        created.assert_status(StatusCode::CREATED);
        let created: Value = created.json();
        assert_eq!(created["categoryName"], json!("Food & Dining"));

        let conflict = server.post(endpoints::BUDGETS_API).json(&body).await;
        conflict.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_rejects_invalid_month_with_field() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::BUDGETS_API)
            .json(&json!({"category": "food", "amount": 10.0, "month": 13, "year": 2024}))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["field"], json!("month"));
    }

    #[tokio::test]
    async fn create_without_amount_names_the_field() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::BUDGETS_API)
            .json(&json!({"categoryName": "food", "month": 3, "year": 2024}))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["field"], json!("amount"));
    }

    #[tokio::test]
    async fn list_with_malformed_month_is_bad_request() {
        let server = get_test_server(get_test_state());

        let response = server
            .get(endpoints::BUDGETS_API)
            .add_query_param("month", "march")
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn bulk_update_rejects_the_same_category_twice() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .put(endpoints::BUDGETS_API)
            .json(&json!({
                "month": 3,
                "year": 2024,
                "budgets": {"food": 0.0, "Food & Dining": 50.0},
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["field"], json!("budgets"));
        let connection = state.db_connection.lock().unwrap();
        assert!(
            get_budgets(BudgetPeriod::new(3, 2024).unwrap(), &connection)
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn lists_budgets_with_spending() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            upsert_budget("travel", 200.0, BudgetPeriod::new(3, 2024).unwrap(), &connection)
                .unwrap();
        }

        let Json(budgets) = get_budgets_endpoint(
            State(state),
            Ok(Query(BudgetQuery {
                month: Some(3),
                year: Some(2024),
            })),
        )
        .await
        .unwrap();

        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].category_name, "Travel");
        assert_eq!(budgets[0].spent, 0.0);
        assert_eq!(budgets[0].remaining, 200.0);
    }

    #[tokio::test]
    async fn bulk_update_deletes_zero_amounts() {
        let state = get_test_state();
        let period = BudgetPeriod::new(5, 2025).unwrap();
        {
            let connection = state.db_connection.lock().unwrap();
            upsert_budget("food", 100.0, period, &connection).unwrap();
        }

        let Json(result) = bulk_update_budgets_endpoint(
            State(state.clone()),
            Ok(Json(BulkBudgetRequest {
                month: Some(5),
                year: Some(2025),
                budgets: BTreeMap::from([
                    ("food".to_owned(), 0.0),
                    ("bills".to_owned(), 80.0),
                ]),
            })),
        )
        .await
        .unwrap();

        assert_eq!(result.total_deleted, 1);
        assert_eq!(result.total_updated, 1);
        let connection = state.db_connection.lock().unwrap();
        let budgets = get_budgets(period, &connection).unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].category_name, "Bills & Services");
    }

    #[tokio::test]
    async fn delete_missing_budget_is_not_found() {
        let result = delete_budget_endpoint(State(get_test_state()), Path(42)).await;

        assert!(matches!(result, Err(Error::NotFound)), "got {result:?}");
    }

    #[tokio::test]
    async fn delete_route_returns_not_found_status() {
        let server = get_test_server(get_test_state());

        server
            .delete(&endpoints::format_endpoint(endpoints::BUDGET, 7))
            .await
            .assert_status_not_found();
    }
}
