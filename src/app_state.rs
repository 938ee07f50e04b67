//! Implements a struct that holds the state of the server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize, relay::NotificationRelay, timezone::get_local_offset};

/// The state of the server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The relay that transaction changes are published on.
    pub relay: NotificationRelay,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    /// `relay_capacity` is the number of events buffered for each live dashboard.
    ///
    /// # Errors
    /// Returns an error if the timezone is invalid or the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        relay_capacity: usize,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            relay: NotificationRelay::new(relay_capacity),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::{AppState, Error};

    #[test]
    fn rejects_invalid_timezone() {
        let connection = Connection::open_in_memory().unwrap();

        let result = AppState::new(connection, "Not/AZone", 8);

        assert!(
            matches!(result, Err(Error::InvalidTimezoneError(ref timezone)) if timezone == "Not/AZone"),
        );
    }

    #[test]
    fn initializes_database() {
        let connection = Connection::open_in_memory().unwrap();

        let state = AppState::new(connection, "Etc/UTC", 8).unwrap();

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('transaction', 'budget')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 2);
    }
}
