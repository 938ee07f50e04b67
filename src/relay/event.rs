//! The change events published after a transaction mutation.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::transaction::Transaction;

/// The kind of change made to a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    /// A new transaction was recorded.
    Created,
    /// An existing transaction was changed.
    Updated,
    /// A transaction was removed.
    Deleted,
}

/// A change to a single transaction, broadcast to every live dashboard.
///
/// The transaction is always the full record: the new state for `created`
/// and `updated`, and the removed row for `deleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// What happened to the transaction.
    pub action: EventAction,
    /// The transaction the event is about.
    pub transaction: Transaction,
    /// When the event was published.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl NotificationEvent {
    /// Create an event stamped with the current time.
    pub fn new(action: EventAction, transaction: Transaction) -> Self {
        Self {
            action,
            transaction,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}
