//! The per-connection dashboard session that keeps a local copy of the
//! transactions up to date from relay events.
//!
//! A session is owned by exactly one live connection and is only changed
//! through the methods below, so it needs no locking.

use time::Date;

use crate::{
    analytics::{AnalyticsOptions, AnalyticsSnapshot, Budgets, compute_analytics},
    relay::{EventAction, NotificationEvent},
    transaction::Transaction,
};

/// Where a [DashboardSession] is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not subscribed to the relay. Events published now are lost.
    Disconnected,
    /// Subscribed and waiting for the next event.
    ConnectedIdle,
    /// Applying an event to the local transaction list.
    ApplyingEvent,
}

/// A dashboard's local transaction list, budgets and derived analytics.
#[derive(Debug, Clone)]
pub struct DashboardSession {
    state: SessionState,
    transactions: Vec<Transaction>,
    budgets: Budgets,
    options: AnalyticsOptions,
    snapshot: AnalyticsSnapshot,
}

impl DashboardSession {
    /// Create a disconnected session seeded with `transactions` and `budgets`.
    pub fn new(transactions: Vec<Transaction>, budgets: Budgets, options: AnalyticsOptions) -> Self {
        let snapshot = compute_analytics(&transactions, &budgets, &options);

        Self {
            state: SessionState::Disconnected,
            transactions,
            budgets,
            options,
            snapshot,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The local transaction list, most recently added first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The budgets used for the budget analysis.
    pub fn budgets(&self) -> &Budgets {
        &self.budgets
    }

    /// The analytics for the current transactions and budgets.
    pub fn snapshot(&self) -> &AnalyticsSnapshot {
        &self.snapshot
    }

    /// Mark the session as subscribed.
    pub fn connect(&mut self) {
        if self.state == SessionState::Disconnected {
            tracing::debug!("dashboard session connected");
            self.state = SessionState::ConnectedIdle;
        }
    }

    /// Mark the session as no longer subscribed, e.g. after the transport
    /// was lost or events were missed.
    pub fn disconnect(&mut self) {
        if self.state != SessionState::Disconnected {
            tracing::debug!("dashboard session disconnected");
        }

        self.state = SessionState::Disconnected;
    }

    /// Subscribe again after a disconnect.
    ///
    /// Events published while disconnected are not replayed, so pass the
    /// transactions refetched from the store to replace the local list.
    pub fn reconnect(&mut self, refetched: Option<Vec<Transaction>>) {
        if let Some(transactions) = refetched {
            self.transactions = transactions;
            self.recompute();
        }

        self.state = SessionState::ConnectedIdle;
    }

    /// The date the analytics treat as today.
    pub fn today(&self) -> Date {
        self.options.today
    }

    /// Move the session to a new day, replacing the budgets with those of
    /// the month `today` falls in.
    pub fn roll_over(&mut self, today: Date, budgets: Budgets) {
        self.options = AnalyticsOptions {
            today,
            year: today.year(),
            ..self.options
        };
        self.budgets = budgets;
        self.recompute();
    }

    /// Replace the budgets and recompute the analytics.
    pub fn set_budgets(&mut self, budgets: Budgets) {
        self.budgets = budgets;
        self.recompute();
    }

    /// Apply a relay event to the local transaction list.
    ///
    /// - `created` adds the transaction to the front unless one with the same ID is present,
    /// - `updated` replaces the transaction with the same ID in place,
    /// - `deleted` removes the transaction with the same ID.
    ///
    /// Events for unknown IDs and duplicate deliveries change nothing. Events
    /// are ignored while disconnected.
    ///
    /// Returns whether the local list changed.
    pub fn apply_event(&mut self, event: &NotificationEvent) -> bool {
        if self.state == SessionState::Disconnected {
            tracing::debug!(
                "ignoring {:?} event for transaction {} while disconnected",
                event.action,
                event.transaction.id
            );
            return false;
        }

        self.state = SessionState::ApplyingEvent;

        let id = event.transaction.id;
        let position = self
            .transactions
            .iter()
            .position(|transaction| transaction.id == id);

        let changed = match (event.action, position) {
            (EventAction::Created, None) => {
                self.transactions.insert(0, event.transaction.clone());
                true
            }
            (EventAction::Updated, Some(index)) => {
                self.transactions[index] = event.transaction.clone();
                true
            }
            (EventAction::Deleted, Some(index)) => {
                self.transactions.remove(index);
                true
            }
            (EventAction::Created, Some(_))
            | (EventAction::Updated, None)
            | (EventAction::Deleted, None) => false,
        };

        if changed {
            self.recompute();
        }

        self.state = SessionState::ConnectedIdle;

        changed
    }

    fn recompute(&mut self) {
        self.snapshot = compute_analytics(&self.transactions, &self.budgets, &self.options);
    }
}
