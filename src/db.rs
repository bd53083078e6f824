//! Creates the application database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::Deserialize;

use crate::{
    Error, account::create_account_table, category::create_category_table,
    goal::create_goal_table, installment::create_installment_plan_table,
    ledger::{create_ledger_entry_table, create_transfer_table},
    recurrence::create_recurring_transaction_table,
};

/// Which rows to return from tables with an `is_active` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    /// Only rows that are in use.
    #[default]
    Active,
    /// Only archived rows.
    Inactive,
    /// Every row.
    All,
}

impl StatusFilter {
    /// The SQL condition on `is_active` for this filter.
    pub(crate) fn condition(self) -> &'static str {
        match self {
            Self::Active => "is_active = 1",
            Self::Inactive => "is_active = 0",
            Self::All => "1 = 1",
        }
    }
}

/// Create the tables for every domain model if they do not exist yet and
/// enable foreign key enforcement on `connection`.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must run first.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_account_table(&transaction)?;
    create_installment_plan_table(&transaction)?;
    create_recurring_transaction_table(&transaction)?;
    create_ledger_entry_table(&transaction)?;
    create_transfer_table(&transaction)?;
    create_goal_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), initialize(&connection));
    }

    #[test]
    fn can_run_twice() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        assert_eq!(Ok(()), initialize(&connection));
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let enabled: bool = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert!(enabled);
    }
}
