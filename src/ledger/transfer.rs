//! Transfers move money between two accounts without counting as income or
//! expense.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    account::{AccountId, get_active_account},
    database_id::DatabaseId,
    money::{from_cents, to_cents, validate_amount},
};

/// Database identifier for a transfer.
pub type TransferId = DatabaseId;

/// Money moved from one account to another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    /// The ID of the transfer.
    pub id: TransferId,
    /// The account the money left.
    pub from_account_id: AccountId,
    /// The account the money arrived in.
    pub to_account_id: AccountId,
    /// The positive amount moved.
    pub amount: Decimal,
    /// When the money moved.
    pub date: Date,
    /// A note about the transfer. May be empty.
    pub description: String,
}

/// The fields needed to record or edit a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransfer {
    /// The account the money left.
    pub from_account_id: AccountId,
    /// The account the money arrived in.
    pub to_account_id: AccountId,
    /// The positive amount moved.
    pub amount: Decimal,
    /// When the money moved.
    pub date: Date,
    /// A note about the transfer.
    pub description: String,
}

fn validate_transfer(transfer: &NewTransfer, connection: &Connection) -> Result<i64, Error> {
    if transfer.from_account_id == transfer.to_account_id {
        return Err(Error::SameAccountTransfer);
    }

    validate_amount(transfer.amount)?;
    get_active_account(transfer.from_account_id, connection)?;
    get_active_account(transfer.to_account_id, connection)?;

    to_cents(transfer.amount)
}

/// Record a transfer between two active accounts.
///
/// # Errors
/// This function will return a:
/// - [Error::SameAccountTransfer] if both accounts are the same,
/// - [Error::NonPositiveAmount] or [Error::TooManyDecimalPlaces] for invalid amounts,
/// - [Error::InvalidAccount] if either account does not exist or is archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transfer(transfer: NewTransfer, connection: &Connection) -> Result<Transfer, Error> {
    let amount_cents = validate_transfer(&transfer, connection)?;

    connection
        .prepare(
            "INSERT INTO transfer (from_account_id, to_account_id, amount_cents, date, description)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, from_account_id, to_account_id, amount_cents, date, description",
        )?
        .query_row(
            (
                transfer.from_account_id,
                transfer.to_account_id,
                amount_cents,
                transfer.date,
                transfer.description.trim(),
            ),
            map_transfer_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a transfer by its ID.
pub fn get_transfer(id: TransferId, connection: &Connection) -> Result<Transfer, Error> {
    connection
        .prepare(
            "SELECT id, from_account_id, to_account_id, amount_cents, date, description
             FROM transfer WHERE id = ?1",
        )?
        .query_row([id], map_transfer_row)
        .map_err(|error| error.into())
}

/// Replace every field of a transfer, validated as in [create_transfer].
pub fn update_transfer(
    id: TransferId,
    transfer: NewTransfer,
    connection: &Connection,
) -> Result<(), Error> {
    let amount_cents = validate_transfer(&transfer, connection)?;

    let rows_affected = connection.execute(
        "UPDATE transfer
         SET from_account_id = ?1, to_account_id = ?2, amount_cents = ?3, date = ?4, description = ?5
         WHERE id = ?6",
        (
            transfer.from_account_id,
            transfer.to_account_id,
            amount_cents,
            transfer.date,
            transfer.description.trim(),
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransfer);
    }

    Ok(())
}

/// Delete a transfer.
pub fn delete_transfer(id: TransferId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM transfer WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransfer);
    }

    Ok(())
}

/// Get all transfers, most recent first.
pub fn list_transfers(connection: &Connection) -> Result<Vec<Transfer>, Error> {
    connection
        .prepare(
            "SELECT id, from_account_id, to_account_id, amount_cents, date, description
             FROM transfer ORDER BY date DESC, id DESC",
        )?
        .query_map([], map_transfer_row)?
        .map(|maybe_transfer| maybe_transfer.map_err(|error| error.into()))
        .collect()
}

/// Create the transfer table.
pub fn create_transfer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transfer (
            id INTEGER PRIMARY KEY,
            from_account_id INTEGER NOT NULL,
            to_account_id INTEGER NOT NULL,
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            FOREIGN KEY(from_account_id) REFERENCES account(id),
            FOREIGN KEY(to_account_id) REFERENCES account(id),
            CHECK (from_account_id <> to_account_id)
        )",
        (),
    )?;

    Ok(())
}

fn map_transfer_row(row: &Row) -> Result<Transfer, rusqlite::Error> {
    let amount_cents: i64 = row.get(3)?;

    Ok(Transfer {
        id: row.get(0)?,
        from_account_id: row.get(1)?,
        to_account_id: row.get(2)?,
        amount: from_cents(amount_cents),
        date: row.get(4)?,
        description: row.get(5)?,
    })
}

#[cfg(test)]
mod transfer_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, create_account, delete_account, toggle_account_active},
        db::initialize,
        ledger::{
            NewTransfer, create_transfer, delete_transfer, get_transfer, list_transfers,
            update_transfer,
        },
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn create_accounts(connection: &Connection) -> (Account, Account) {
        (
            create_account("Checking", connection).unwrap(),
            create_account("Savings", connection).unwrap(),
        )
    }

    fn new_transfer(from: &Account, to: &Account) -> NewTransfer {
        NewTransfer {
            from_account_id: from.id,
            to_account_id: to.id,
            amount: dec!(250.00),
            date: date!(2024 - 04 - 01),
            description: "Monthly saving".to_owned(),
        }
    }

    #[test]
    fn create_transfer_succeeds() {
        let connection = get_test_connection();
        let (checking, savings) = create_accounts(&connection);

        let transfer = create_transfer(new_transfer(&checking, &savings), &connection).unwrap();

        assert_eq!(transfer.amount, dec!(250));
        assert_eq!(get_transfer(transfer.id, &connection), Ok(transfer));
    }

    #[test]
    fn create_transfer_rejects_same_account() {
        let connection = get_test_connection();
        let (checking, _) = create_accounts(&connection);

        let result = create_transfer(new_transfer(&checking, &checking), &connection);

        assert_eq!(result, Err(Error::SameAccountTransfer));
    }

    #[test]
    fn create_transfer_rejects_archived_account() {
        let connection = get_test_connection();
        let (checking, savings) = create_accounts(&connection);
        toggle_account_active(savings.id, &connection).unwrap();

        let result = create_transfer(new_transfer(&checking, &savings), &connection);

        assert_eq!(result, Err(Error::InvalidAccount(savings.id)));
    }

    #[test]
    fn update_and_delete_transfer() {
        let connection = get_test_connection();
        let (checking, savings) = create_accounts(&connection);
        let transfer = create_transfer(new_transfer(&checking, &savings), &connection).unwrap();

        update_transfer(
            transfer.id,
            NewTransfer {
                amount: dec!(300),
                ..new_transfer(&savings, &checking)
            },
            &connection,
        )
        .unwrap();
        let updated = get_transfer(transfer.id, &connection).unwrap();
        assert_eq!(updated.from_account_id, savings.id);
        assert_eq!(updated.amount, dec!(300));

        assert_eq!(delete_transfer(transfer.id, &connection), Ok(()));
        assert_eq!(list_transfers(&connection), Ok(vec![]));
        assert_eq!(
            delete_transfer(transfer.id, &connection),
            Err(Error::DeleteMissingTransfer)
        );
    }

    #[test]
    fn update_missing_transfer_fails() {
        let connection = get_test_connection();
        let (checking, savings) = create_accounts(&connection);

        assert_eq!(
            update_transfer(7, new_transfer(&checking, &savings), &connection),
            Err(Error::UpdateMissingTransfer)
        );
    }

    #[test]
    fn account_with_transfers_cannot_be_deleted() {
        let connection = get_test_connection();
        let (checking, savings) = create_accounts(&connection);
        create_transfer(new_transfer(&checking, &savings), &connection).unwrap();

        assert_eq!(
            delete_account(savings.id, &connection),
            Err(Error::AccountInUse("Savings".to_owned()))
        );
    }
}
