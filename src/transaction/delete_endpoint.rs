//! Defines the endpoint for deleting a transaction.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    database_id::TransactionId,
    relay::{EventAction, NotificationEvent},
    transaction::{Transaction, TransactionState, delete_transaction},
};

/// A route handler for deleting a transaction, responds with the removed
/// transaction or 404 if it does not exist.
///
/// A `deleted` event carrying the removed transaction is published once the
/// row is gone.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let deleted = {
        let connection = state.lock_connection()?;
        delete_transaction(transaction_id, &connection)?
    };

    tracing::info!("deleted transaction {transaction_id}");
    state
        .relay
        .publish(NotificationEvent::new(EventAction::Deleted, deleted.clone()));

    Ok(Json(deleted))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        routing::{delete, get},
    };
    use axum_test::TestServer;
    use time::macros::date;

    use crate::{
        endpoints::{self, format_endpoint},
        relay::{Delivery, EventAction, NotificationRelay},
        test_utils::get_test_connection,
        transaction::{
            Transaction, TransactionOrder, TransactionState, TransactionType, create_transaction,
            delete_transaction_endpoint, get_transaction_endpoint, list_transactions,
        },
    };

    fn get_test_state() -> TransactionState {
        TransactionState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
            relay: NotificationRelay::new(8),
        }
    }

    fn get_test_server(state: TransactionState) -> TestServer {
        let app = Router::new()
            .route(
                endpoints::TRANSACTION,
                get(get_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn deletes_transaction_and_publishes_full_record() {
        let state = get_test_state();
        let transaction = {
            let connection = state.db_connection.lock().unwrap();
            let transaction =
                Transaction::build(1.23, date!(2025 - 10 - 26), "Test", TransactionType::Expense)
                    .validate()
                    .unwrap();
            create_transaction(&transaction, &connection).unwrap()
        };
        let mut subscription = state.relay.subscribe();
        let server = get_test_server(state.clone());
        let path = format_endpoint(endpoints::TRANSACTION, transaction.id);

        server.delete(&path).await.assert_status_ok();

        let remaining =
            list_transactions(TransactionOrder::NewestCreated, None, &state.db_connection.lock().unwrap())
                .unwrap();
        assert!(remaining.is_empty());
        server.get(&path).await.assert_status_not_found();
        match subscription.next_delivery().await {
            Delivery::Event(event) => {
                assert_eq!(event.action, EventAction::Deleted);
                assert_eq!(event.transaction, transaction);
            }
            other => panic!("want a deleted event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deleting_missing_transaction_is_not_found() {
        let server = get_test_server(get_test_state());

        server
            .delete(&format_endpoint(endpoints::TRANSACTION, 1))
            .await
            .assert_status_not_found();
    }
}
