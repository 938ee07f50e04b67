//! Defines the endpoints for reading transactions.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{
        Transaction, TransactionOrder, TransactionState, get_transaction, list_transactions,
    },
};

/// The number of transactions listed when no limit is given.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// The query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// The maximum number of transactions to return.
    pub limit: Option<u32>,
}

/// A route handler that lists the most recently recorded transactions.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    query: Result<Query<ListTransactionsQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let Query(query) = query?;
    let connection = state.lock_connection()?;

    list_transactions(
        TransactionOrder::NewestCreated,
        Some(query.limit.unwrap_or(DEFAULT_LIST_LIMIT)),
        &connection,
    )
    .inspect_err(|error| tracing::error!("could not list transactions: {error}"))
    .map(Json)
}

/// A route handler that gets a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state.lock_connection()?;

    get_transaction(transaction_id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Path, Query, State, rejection::QueryRejection},
    };
    use time::macros::date;

    use crate::{
        Error,
        relay::NotificationRelay,
        test_utils::get_test_connection,
        transaction::{
            Transaction, TransactionState, TransactionType, create_transaction,
            get_endpoint::{ListTransactionsQuery, get_transaction_endpoint, list_transactions_endpoint},
        },
    };

    fn get_test_state(count: usize) -> TransactionState {
        let connection = get_test_connection();
        for i in 1..=count {
            let transaction = Transaction::build(
                i as f64,
                date!(2025 - 01 - 01),
                "Test",
                TransactionType::Expense,
            )
            .validate()
            .unwrap();
            create_transaction(&transaction, &connection).unwrap();
        }

        TransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            relay: NotificationRelay::default(),
        }
    }

    #[tokio::test]
    async fn lists_newest_first_with_limit() {
        let state = get_test_state(5);

        let Json(transactions) = list_transactions_endpoint(
            State(state),
            Ok(Query(ListTransactionsQuery { limit: Some(2) })),
        )
        .await
        .unwrap();

        let ids: Vec<_> = transactions.iter().map(|transaction| transaction.id).collect();
        assert_eq!(ids, [5, 4]);
    }

    #[tokio::test]
    async fn list_defaults_to_one_hundred() {
        let state = get_test_state(101);

        let Json(transactions) =
            list_transactions_endpoint(State(state), Ok(Query(ListTransactionsQuery::default())))
                .await
                .unwrap();

        assert_eq!(transactions.len(), 100);
    }

    #[tokio::test]
    async fn gets_single_transaction() {
        let state = get_test_state(1);

        let Json(transaction) = get_transaction_endpoint(State(state.clone()), Path(1))
            .await
            .unwrap();
        let missing = get_transaction_endpoint(State(state), Path(2)).await;

        assert_eq!(transaction.amount, 1.0);
        assert!(matches!(missing, Err(Error::NotFound)), "got {missing:?}");
    }
}
