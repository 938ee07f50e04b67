//! Defines the endpoint for creating a new transaction.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    Error,
    relay::{EventAction, NotificationEvent},
    transaction::{Transaction, TransactionForm, TransactionState, create_transaction},
};

/// A route handler for creating a new transaction, responds with 201 and the
/// stored transaction.
///
/// A `created` event is published once the transaction has been saved.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    body: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Json(form) = body?;
    let transaction = form.validate()?;

    let created = {
        let connection = state.lock_connection()?;
        create_transaction(&transaction, &connection)
            .inspect_err(|error| tracing::error!("could not create transaction: {error}"))?
    };

    tracing::info!("created transaction {}", created.id);
    state
        .relay
        .publish(NotificationEvent::new(EventAction::Created, created.clone()));

    Ok((StatusCode::CREATED, Json(created)))
}
