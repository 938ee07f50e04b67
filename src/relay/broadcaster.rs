//! An in-process publish/subscribe relay for [NotificationEvent]s.

use tokio::sync::broadcast::{self, error::RecvError};

use crate::relay::NotificationEvent;

/// The name of the single channel that all transaction changes are sent on.
pub const FINANCE_UPDATES_CHANNEL: &str = "finance-updates";

/// How many events a subscriber may fall behind by before it starts missing events.
pub const DEFAULT_RELAY_CAPACITY: usize = 64;

/// Fans out transaction change events to every live subscriber.
///
/// Delivery is best-effort: events are not stored, acknowledged or retried.
/// A subscriber only sees events published while it is subscribed, and events
/// from one publisher arrive in the order they were published.
///
/// Cloning the relay gives another handle to the same channel.
#[derive(Debug, Clone)]
pub struct NotificationRelay {
    sender: broadcast::Sender<NotificationEvent>,
}

impl NotificationRelay {
    /// Create a relay where each subscriber buffers up to `capacity` events.
    ///
    /// A `capacity` of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));

        Self { sender }
    }

    /// Send `event` to every current subscriber.
    ///
    /// Never fails: if nobody is listening the event is dropped.
    pub fn publish(&self, event: NotificationEvent) {
        let action = event.action;
        let transaction_id = event.transaction.id;

        match self.sender.send(event) {
            Ok(receiver_count) => tracing::debug!(
                "published {action:?} event for transaction {transaction_id} on \
                {FINANCE_UPDATES_CHANNEL} to {receiver_count} subscriber(s)"
            ),
            Err(_) => tracing::debug!(
                "dropped {action:?} event for transaction {transaction_id}: \
                no subscribers on {FINANCE_UPDATES_CHANNEL}"
            ),
        }
    }

    /// Start receiving events published from now on.
    ///
    /// Dropping the returned [Subscription] (or calling
    /// [Subscription::unsubscribe]) stops delivery.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// The number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationRelay {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_CAPACITY)
    }
}

/// The outcome of waiting for the next event on a [Subscription].
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The next event in publish order.
    Event(NotificationEvent),
    /// The subscriber fell behind and this many events were lost.
    ///
    /// The subscriber should refetch its data to recover.
    Missed(u64),
    /// The relay has been dropped and no more events will arrive.
    Closed,
}

/// A registration with a [NotificationRelay].
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<NotificationEvent>,
}

impl Subscription {
    /// Wait for the next delivery.
    pub async fn next_delivery(&mut self) -> Delivery {
        match self.receiver.recv().await {
            Ok(event) => Delivery::Event(event),
            Err(RecvError::Lagged(missed)) => Delivery::Missed(missed),
            Err(RecvError::Closed) => Delivery::Closed,
        }
    }

    /// Stop receiving events.
    pub fn unsubscribe(self) {
        drop(self);
    }
}
