//! Defines the endpoint for replacing an existing transaction.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    Error,
    database_id::TransactionId,
    relay::{EventAction, NotificationEvent},
    transaction::{Transaction, TransactionForm, TransactionState, update_transaction},
};

/// A route handler for updating a transaction, responds with the new state of
/// the transaction or 404 if it does not exist.
///
/// An `updated` event is published once the change has been saved.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(transaction_id): Path<TransactionId>,
    body: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Json(form) = body?;
    let transaction = form.validate()?;

    let updated = {
        let connection = state.lock_connection()?;
        update_transaction(transaction_id, &transaction, &connection).inspect_err(|error| {
            tracing::error!("could not update transaction {transaction_id}: {error}")
        })?
    };

    tracing::info!("updated transaction {transaction_id}");
    state
        .relay
        .publish(NotificationEvent::new(EventAction::Updated, updated.clone()));

    Ok(Json(updated))
}
