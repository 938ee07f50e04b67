//! Streams relay events and refreshed analytics to a dashboard over a WebSocket.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{
        FromRef, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    AppState, Error,
    analytics::{AnalyticsOptions, AnalyticsSnapshot, Budgets},
    budget::{BudgetPeriod, budget_limits, get_budgets},
    relay::{Delivery, NotificationEvent, NotificationRelay, Subscription},
    session::DashboardSession,
    timezone::local_today,
    transaction::{Transaction, TransactionOrder, list_transactions},
};

/// The state needed for streaming live updates.
#[derive(Debug, Clone)]
pub struct LiveUpdatesState {
    /// The database connection for seeding and refetching sessions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The relay that transaction changes are published on.
    pub relay: NotificationRelay,
}

impl FromRef<AppState> for LiveUpdatesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            relay: state.relay.clone(),
        }
    }
}

/// A message sent from the server to a live dashboard.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LiveMessage<'a> {
    /// The full analytics, sent on connect and after missed events.
    Snapshot {
        /// The analytics for every transaction.
        snapshot: &'a AnalyticsSnapshot,
    },
    /// A transaction change and the analytics after applying it.
    Update {
        /// The change that was applied.
        event: &'a NotificationEvent,
        /// The analytics after the change.
        snapshot: &'a AnalyticsSnapshot,
    },
}

/// A route handler that upgrades to a WebSocket streaming [LiveMessage]s.
///
/// The connection is subscribed before the upgrade completes so that no
/// change made after the request is accepted can be missed.
pub async fn live_updates_endpoint(
    State(state): State<LiveUpdatesState>,
    upgrade: WebSocketUpgrade,
) -> Response {
    let subscription = state.relay.subscribe();

    upgrade.on_upgrade(move |socket| stream_updates(socket, subscription, state))
}

async fn stream_updates(
    mut socket: WebSocket,
    mut subscription: Subscription,
    state: LiveUpdatesState,
) {
    let mut session = match load_session(&state) {
        Ok(session) => session,
        Err(error) => {
            tracing::error!("could not start live dashboard session: {error}");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    session.connect();

    if send_message(
        &mut socket,
        &LiveMessage::Snapshot {
            snapshot: session.snapshot(),
        },
    )
    .await
    .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            delivery = subscription.next_delivery() => match delivery {
                Delivery::Event(event) => {
                    if let Err(error) = roll_over_if_new_day(&state, &mut session) {
                        tracing::error!("could not move live dashboard session to today: {error}");
                        break;
                    }

                    session.apply_event(&event);

                    let message = LiveMessage::Update {
                        event: &event,
                        snapshot: session.snapshot(),
                    };

                    if send_message(&mut socket, &message).await.is_err() {
                        break;
                    }
                }
                Delivery::Missed(count) => {
                    tracing::warn!("live dashboard session missed {count} events, refetching");
                    session.disconnect();

                    match refetch(&state) {
                        Ok(refetched) => {
                            session.roll_over(refetched.today, refetched.budgets);
                            session.reconnect(Some(refetched.transactions));
                        }
                        Err(error) => {
                            tracing::error!("could not refetch live dashboard session: {error}");
                            break;
                        }
                    }

                    let message = LiveMessage::Snapshot {
                        snapshot: session.snapshot(),
                    };

                    if send_message(&mut socket, &message).await.is_err() {
                        break;
                    }
                }
                Delivery::Closed => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Clients have nothing to say, pings are answered by axum.
                Some(Ok(_)) => {}
            },
        }
    }

    session.disconnect();
    subscription.unsubscribe();
    tracing::debug!("live dashboard session closed");
}

async fn send_message(socket: &mut WebSocket, message: &LiveMessage<'_>) -> Result<(), ()> {
    let text = serde_json::to_string(message).map_err(|error| {
        tracing::error!("could not serialize live message: {error}");
    })?;

    socket
        .send(Message::Text(text.into()))
        .await
        .map_err(|error| tracing::debug!("could not send live message: {error}"))
}

/// Everything a session is seeded with, read from the store at one time.
struct Refetched {
    today: Date,
    transactions: Vec<Transaction>,
    budgets: Budgets,
}

fn load_session(state: &LiveUpdatesState) -> Result<DashboardSession, Error> {
    let refetched = refetch(state)?;

    Ok(DashboardSession::new(
        refetched.transactions,
        refetched.budgets,
        AnalyticsOptions::for_today(refetched.today),
    ))
}

fn lock_connection(state: &LiveUpdatesState) -> Result<MutexGuard<'_, Connection>, Error> {
    state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

fn refetch(state: &LiveUpdatesState) -> Result<Refetched, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(state)?;

    let transactions = list_transactions(TransactionOrder::NewestCreated, None, &connection)?;
    let budgets = get_budgets(BudgetPeriod::containing(today), &connection)?;

    Ok(Refetched {
        today,
        transactions,
        budgets: budget_limits(&budgets),
    })
}

fn roll_over_if_new_day(
    state: &LiveUpdatesState,
    session: &mut DashboardSession,
) -> Result<(), Error> {
    let today = local_today(&state.local_timezone)?;

    roll_over_to(state, session, today)
}

/// Reload the budgets when `today` is not the session's day, so that the
/// current month moves on for connections that stay open past midnight.
fn roll_over_to(
    state: &LiveUpdatesState,
    session: &mut DashboardSession,
    today: Date,
) -> Result<(), Error> {
    if session.today() == today {
        return Ok(());
    }

    let budgets = get_budgets(BudgetPeriod::containing(today), &*lock_connection(state)?)?;
    tracing::debug!("live dashboard session moved to {today}");
    session.roll_over(today, budget_limits(&budgets));

    Ok(())
}
