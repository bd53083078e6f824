use rusqlite::Connection;

use crate::{
    Error, database_id::DatabaseId, db::StatusFilter, is_foreign_key_violation,
    is_unique_violation,
};

/// Database identifier for an account.
pub type AccountId = DatabaseId;

/// A place where money is held, such as a bank account or a credit card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The unique display name.
    pub name: String,
    /// Archived accounts keep their history but cannot be used for new records.
    pub is_active: bool,
}

/// Create the account table.
pub fn create_account_table(connection: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            is_active INTEGER NOT NULL DEFAULT 1
        )",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Account].
pub fn map_row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let is_active = row.get(2)?;

    Ok(Account {
        id,
        name,
        is_active,
    })
}

fn validate_name(name: &str) -> Result<&str, Error> {
    let name = name.trim();

    if name.is_empty() {
        Err(Error::EmptyName)
    } else {
        Ok(name)
    }
}

fn map_name_error(error: rusqlite::Error, name: &str) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateAccountName(name.to_owned())
    } else {
        error.into()
    }
}

/// Create an active account.
///
/// # Errors
/// Returns [Error::EmptyName] for a blank name, [Error::DuplicateAccountName]
/// if another account already uses the name, or [Error::SqlError] on any other
/// SQL error.
pub fn create_account(name: &str, connection: &Connection) -> Result<Account, Error> {
    let name = validate_name(name)?;

    connection
        .prepare(
            "INSERT INTO account (name, is_active) VALUES (?1, 1)
             RETURNING id, name, is_active",
        )?
        .query_row([name], map_row_to_account)
        .map_err(|error| map_name_error(error, name))
}

/// Retrieve an account by ID, whether or not it is active.
pub fn get_account(account_id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, name, is_active FROM account WHERE id = ?1")?
        .query_row([account_id], map_row_to_account)
        .map_err(|error| error.into())
}

/// Look up an account that new records may reference.
///
/// # Errors
/// Returns [Error::InvalidAccount] if the account does not exist or is archived.
pub fn get_active_account(account_id: AccountId, connection: &Connection) -> Result<Account, Error> {
    match get_account(account_id, connection) {
        Ok(account) if account.is_active => Ok(account),
        Ok(_) | Err(Error::NotFound) => Err(Error::InvalidAccount(account_id)),
        Err(error) => Err(error),
    }
}

/// Get accounts ordered by name.
pub fn list_accounts(filter: StatusFilter, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT id, name, is_active FROM account WHERE {} ORDER BY name ASC",
            filter.condition()
        ))?
        .query_map([], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Rename an account.
pub fn update_account(account_id: AccountId, name: &str, connection: &Connection) -> Result<(), Error> {
    let name = validate_name(name)?;

    let rows_affected = connection
        .execute(
            "UPDATE account SET name = ?1 WHERE id = ?2",
            (name, account_id),
        )
        .map_err(|error| map_name_error(error, name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    Ok(())
}

/// Archive an active account or restore an archived one.
///
/// Returns whether the account is active afterwards.
pub fn toggle_account_active(account_id: AccountId, connection: &Connection) -> Result<bool, Error> {
    let is_active = connection
        .prepare("UPDATE account SET is_active = NOT is_active WHERE id = ?1 RETURNING is_active")?
        .query_row([account_id], |row| row.get(0))
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingAccount,
            error => error.into(),
        })?;

    tracing::info!(
        "Account {account_id} is now {}",
        if is_active { "active" } else { "archived" }
    );

    Ok(is_active)
}

/// Delete an account that nothing refers to.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingAccount] if the account does not exist,
/// - [Error::AccountInUse] if entries, transfers, installment plans or
///   recurring transactions still refer to it,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_account(account_id: AccountId, connection: &Connection) -> Result<(), Error> {
    let account = match get_account(account_id, connection) {
        Ok(account) => account,
        Err(Error::NotFound) => return Err(Error::DeleteMissingAccount),
        Err(error) => return Err(error),
    };

    let is_referenced: bool = connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM ledger_entry WHERE account_id = ?1)
             OR EXISTS (SELECT 1 FROM transfer WHERE from_account_id = ?1 OR to_account_id = ?1)
             OR EXISTS (SELECT 1 FROM installment_plan WHERE account_id = ?1)
             OR EXISTS (SELECT 1 FROM recurring_transaction WHERE account_id = ?1)",
        [account_id],
        |row| row.get(0),
    )?;

    if is_referenced {
        return Err(Error::AccountInUse(account.name));
    }

    connection
        .execute("DELETE FROM account WHERE id = ?1", [account_id])
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                Error::AccountInUse(account.name.clone())
            } else {
                error.into()
            }
        })?;

    Ok(())
}
