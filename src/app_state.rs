//! Implements a struct that holds the shared state of the application.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{Error, clock::SystemClock, db::initialize};

/// The state shared by whatever drives the application, e.g. a server or a
/// scheduled job.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the timezone is unknown or the database cannot be initialized.
    pub fn new(db_connection: Connection, local_timezone: &str) -> Result<Self, Error> {
        SystemClock::new(local_timezone)?;
        initialize(&db_connection)?;

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// A clock that reports dates in the local timezone.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if the timezone is not known.
    pub fn clock(&self) -> Result<SystemClock, Error> {
        SystemClock::new(&self.local_timezone)
    }

    /// Lock the database connection.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if another thread panicked while holding the lock.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)
    }
}
