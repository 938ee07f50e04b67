//! Fintrack is a web app for tracking personal income, expenses and monthly budgets.
//!
//! This library provides a JSON API, a server-rendered dashboard and a
//! WebSocket that pushes transaction changes to every open dashboard.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod analytics;
mod app_state;
mod budget;
mod category;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod logging;
mod relay;
mod routing;
mod session;
#[cfg(test)]
mod test_utils;
mod timezone;
mod transaction;

pub use analytics::{
    AnalyticsOptions, AnalyticsSnapshot, BudgetHealth, BudgetStatus, Budgets, CategoryFilter,
    compute_analytics,
};
pub use app_state::AppState;
pub use budget::{Budget, BudgetPeriod, upsert_budget};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use relay::{
    DEFAULT_RELAY_CAPACITY, Delivery, EventAction, NotificationEvent, NotificationRelay,
    Subscription,
};
pub use routing::build_router;
pub use session::{DashboardSession, SessionState};
pub use transaction::{
    Transaction, TransactionBuilder, TransactionType, ValidatedTransaction, create_transaction,
};

use crate::html::{alert_view, error_view};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction or budget amount was zero, negative or not a number.
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    InvalidAmount(f64),

    /// A transaction description was empty or only whitespace.
    #[error("the description cannot be empty")]
    EmptyDescription,

    /// A transaction description was longer than the maximum length.
    #[error("the description is {0} characters long, which is too long")]
    DescriptionTooLong(usize),

    /// A transaction type other than "income" or "expense" was given.
    #[error("\"{0}\" is not a valid transaction type, expected \"income\" or \"expense\"")]
    InvalidTransactionType(String),

    /// A month outside of 1 to 12 was given.
    #[error("{0} is not a valid month, expected a number from 1 to 12")]
    InvalidMonth(u8),

    /// A budget year before 2020 was given.
    #[error("{0} is not a valid year, budgets start from 2020")]
    InvalidYear(i32),

    /// A bulk budget update contained a negative amount.
    #[error("the budget for \"{category_name}\" cannot be {amount}")]
    NegativeBudgetAmount {
        /// The category name as given by the client.
        category_name: String,
        /// The rejected amount.
        amount: f64,
    },

    /// An empty string was used as a budget category name.
    #[error("the category name cannot be empty")]
    EmptyCategoryName,

    /// A bulk budget update named the same category more than once, e.g. by
    /// its ID and its display name.
    #[error("the budget for \"{0}\" is given more than once")]
    DuplicateCategoryName(String),

    /// The request body or query string could not be read, e.g. a required
    /// field was missing or had the wrong format.
    #[error("{message}")]
    InvalidRequest {
        /// The path of the offending field, if it could be determined.
        field: Option<String>,
        /// What was wrong with the request.
        message: String,
    },

    /// A category filter other than "all", "income" or "expense" was given.
    #[error("\"{0}\" is not a valid filter, expected \"all\", \"income\" or \"expense\"")]
    InvalidCategoryFilter(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A budget already exists for the category and month.
    ///
    /// Clients can update the existing budget instead.
    #[error("a budget for \"{category_name}\" in {year}-{month:02} already exists")]
    DuplicateBudget {
        /// The normalised category name.
        category_name: String,
        /// The month of the existing budget.
        month: u8,
        /// The year of the existing budget.
        year: i32,
    },

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl Error {
    /// The name of the request field that caused a validation error, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::InvalidAmount(_) => Some("amount"),
            Error::EmptyDescription | Error::DescriptionTooLong(_) => Some("description"),
            Error::InvalidTransactionType(_) => Some("type"),
            Error::InvalidMonth(_) => Some("month"),
            Error::InvalidYear(_) => Some("year"),
            Error::NegativeBudgetAmount { .. } | Error::DuplicateCategoryName(_) => {
                Some("budgets")
            }
            Error::InvalidRequest { field, .. } => field.as_deref(),
            Error::EmptyCategoryName => Some("categoryName"),
            Error::InvalidCategoryFilter(_) => Some("filter"),
            Error::NotFound
            | Error::DuplicateBudget { .. }
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_) => None,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateBudget { .. } => StatusCode::CONFLICT,
            Error::SqlError(_) | Error::DatabaseLockError | Error::InvalidTimezoneError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Render the error as an HTML error page for handlers that serve pages.
    fn into_page_response(self) -> Response {
        let status_code = self.status_code();

        let page = match &self {
            Error::InvalidTimezoneError(timezone) => error_view(
                "Invalid Timezone Settings",
                "500",
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            error if status_code == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                error_view(
                    "Internal Server Error",
                    "500",
                    "Sorry, something went wrong.",
                    "Try again later or check the server logs",
                )
            }
            error => error_view(
                "Invalid Request",
                status_code.as_str(),
                "Could not save your changes.",
                &error.to_string(),
            ),
        };

        (status_code, page).into_response()
    }

    /// Render the error as an alert for HTMX requests to swap into the alert container.
    fn into_alert_response(self) -> Response {
        let status_code = self.status_code();

        let alert = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            alert_view(
                "Something went wrong.",
                "Try again later or check the server logs",
            )
        } else {
            alert_view("Could not save your changes.", &self.to_string())
        };

        (status_code, alert).into_response()
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected JSON body: {}", rejection.body_text());

        match rejection {
            JsonRejection::JsonDataError(error) => invalid_request(&error.body_text()),
            rejection => Error::InvalidRequest {
                field: None,
                message: rejection.body_text(),
            },
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("rejected query string: {}", rejection.body_text());

        invalid_request(&rejection.body_text())
    }
}

/// Pull the field name out of a deserialization rejection message.
///
/// axum prefixes the serde error with a description of what failed, e.g.
/// "Failed to deserialize the JSON body into the target type: date: invalid
/// value ...". Errors for nested values are prefixed with their path, while
/// a missing field is named in backticks.
fn invalid_request(body_text: &str) -> Error {
    let detail = body_text
        .split_once(": ")
        .map_or(body_text, |(_, detail)| detail);

    let field = if let Some(rest) = detail.strip_prefix("missing field `") {
        rest.split_once('`').map(|(field, _)| field.to_owned())
    } else {
        detail
            .split_once(": ")
            .map(|(path, _)| path)
            .filter(|path| !path.is_empty() && !path.contains(char::is_whitespace))
            .map(str::to_owned)
    };

    Error::InvalidRequest {
        field,
        message: detail.to_owned(),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal details stay in the server logs.
            tracing::error!("An unexpected error occurred: {}", self);
            "an internal error occurred, check the server logs for more details".to_owned()
        } else {
            self.to_string()
        };

        (
            status_code,
            Json(json!({
                "error": message,
                "field": self.field(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use serde_json::{Value, json};

    use crate::{Error, invalid_request, test_utils::parse_json_body};

    async fn into_json(error: Error) -> (StatusCode, Value) {
        parse_json_body(error.into_response()).await
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests_with_field() {
        let (status, body) = into_json(Error::InvalidMonth(13)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], json!("month"));
        assert!(body["error"].as_str().unwrap().contains("13"));
    }

    #[tokio::test]
    async fn not_found_has_no_field() {
        let (status, body) = into_json(Error::NotFound).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["field"], Value::Null);
    }

    #[tokio::test]
    async fn duplicate_budget_is_a_conflict() {
        let (status, _) = into_json(Error::DuplicateBudget {
            category_name: "Travel".to_owned(),
            month: 3,
            year: 2024,
        })
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) =
            into_json(Error::SqlError(rusqlite::Error::InvalidQuery)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().unwrap().contains("SQL"));
    }

    #[test]
    fn missing_field_is_named() {
        let error = invalid_request(
            "Failed to deserialize the JSON body into the target type: missing field `amount` at line 1 column 62",
        );

        assert_eq!(error.field(), Some("amount"));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_field_is_named_by_its_path() {
        let error = invalid_request(
            "Failed to deserialize the JSON body into the target type: date: invalid value at line 1 column 20",
        );

        assert_eq!(error.field(), Some("date"));
    }

    #[test]
    fn serde_messages_without_a_path_have_no_field() {
        let error = invalid_request(
            "Failed to deserialize query string: invalid digit found in string",
        );

        assert_eq!(error.field(), None);
        assert_eq!(error.to_string(), "invalid digit found in string");
    }

    #[tokio::test]
    async fn duplicate_category_names_point_at_budgets() {
        let (status, body) = into_json(Error::DuplicateCategoryName("Food & Dining".to_owned())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], json!("budgets"));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
