//! Real-time notification of transaction changes.
//!
//! This module contains:
//! - The [NotificationEvent] sent when a transaction is created, updated or deleted
//! - The in-process [NotificationRelay] that fans events out to subscribers
//! - The WebSocket endpoint that streams events and refreshed analytics to dashboards

mod broadcaster;
mod event;
mod websocket;

pub use broadcaster::{
    DEFAULT_RELAY_CAPACITY, Delivery, FINANCE_UPDATES_CHANNEL, NotificationRelay, Subscription,
};
pub use event::{EventAction, NotificationEvent};
pub use websocket::{LiveMessage, live_updates_endpoint};
