//! The recurring transaction model and its database queries.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    account::{AccountId, get_active_account},
    category::{CategoryId, get_active_category},
    database_id::DatabaseId,
    money::{from_cents, to_cents, validate_amount},
    recurrence::{Frequency, next_occurrence},
};

/// Database identifier for a recurring transaction.
pub type RecurringTransactionId = DatabaseId;

/// An income or expense that repeats on a schedule, e.g. rent or wages.
///
/// Ledger entries for due occurrences are created by
/// [generate_due_entries](crate::recurrence::generate_due_entries), which
/// moves the `last_generated_date` and `next_due_date` cursor forward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringTransaction {
    /// The ID of the recurring transaction.
    pub id: RecurringTransactionId,
    /// The category of the generated entries.
    pub category_id: CategoryId,
    /// The account of the generated entries.
    pub account_id: AccountId,
    /// The amount of each generated entry.
    pub amount: Decimal,
    /// The description of each generated entry.
    pub description: String,
    /// How often the transaction repeats.
    pub frequency: Frequency,
    /// The date of the first occurrence.
    pub start_date: Date,
    /// No occurrences are generated after this date.
    pub end_date: Option<Date>,
    /// The competence date of the most recent generated occurrence.
    pub last_generated_date: Option<Date>,
    /// The date of the next occurrence, or `None` once the schedule has ended.
    pub next_due_date: Option<Date>,
    /// Paused definitions are skipped by the generator.
    pub is_active: bool,
}

/// The fields needed to create or edit a recurring transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringTransaction {
    /// The category of the generated entries.
    pub category_id: CategoryId,
    /// The account of the generated entries.
    pub account_id: AccountId,
    /// The amount of each generated entry.
    pub amount: Decimal,
    /// The description of each generated entry.
    pub description: String,
    /// How often the transaction repeats.
    pub frequency: Frequency,
    /// The date of the first occurrence.
    pub start_date: Date,
    /// The last date an occurrence may fall on.
    pub end_date: Option<Date>,
}

impl NewRecurringTransaction {
    fn validate(&self, connection: &Connection) -> Result<i64, Error> {
        validate_amount(self.amount)?;

        if let Some(end_date) = self.end_date
            && end_date < self.start_date
        {
            return Err(Error::EndDateBeforeStartDate {
                start: self.start_date,
                end: end_date,
            });
        }

        get_active_category(self.category_id, connection)?;
        get_active_account(self.account_id, connection)?;

        to_cents(self.amount)
    }
}

const RECURRING_COLUMNS: &str = "id, category_id, account_id, amount_cents, description, \
    frequency, start_date, end_date, last_generated_date, next_due_date, is_active";

/// Create an active recurring transaction whose first occurrence is due on
/// its start date.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] or [Error::TooManyDecimalPlaces] for invalid amounts,
/// - [Error::EndDateBeforeStartDate] if the end date is before the start date,
/// - [Error::InvalidCategory] or [Error::InvalidAccount] if the references are not active,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_recurring_transaction(
    recurring: NewRecurringTransaction,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    let amount_cents = recurring.validate(connection)?;

    connection
        .prepare(&format!(
            "INSERT INTO recurring_transaction (category_id, account_id, amount_cents,
                description, frequency, start_date, end_date, last_generated_date,
                next_due_date, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?6, 1)
             RETURNING {RECURRING_COLUMNS}"
        ))?
        .query_row(
            (
                recurring.category_id,
                recurring.account_id,
                amount_cents,
                recurring.description.trim(),
                recurring.frequency,
                recurring.start_date,
                recurring.end_date,
            ),
            map_recurring_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a recurring transaction by its ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such recurring transaction and
/// [Error::UnknownFrequency] if its stored frequency is not recognised.
pub fn get_recurring_transaction(
    id: RecurringTransactionId,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction WHERE id = ?1"
        ))?
        .query_row([id], map_recurring_transaction_row)
        .map_err(|error| error.into())
}

/// Get recurring transactions ordered by their next due date, ended ones last.
pub fn list_recurring_transactions(
    active_only: bool,
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction
             WHERE (?1 = 0 OR is_active = 1)
             ORDER BY next_due_date IS NULL, next_due_date ASC, id ASC"
        ))?
        .query_map([active_only], map_recurring_transaction_row)?
        .map(|maybe_recurring| maybe_recurring.map_err(|error| error.into()))
        .collect()
}

/// The IDs of every active recurring transaction, without decoding the rows.
pub(crate) fn list_active_recurring_ids(
    connection: &Connection,
) -> Result<Vec<RecurringTransactionId>, Error> {
    connection
        .prepare("SELECT id FROM recurring_transaction WHERE is_active = 1 ORDER BY id ASC")?
        .query_map([], |row| row.get(0))?
        .map(|maybe_id| maybe_id.map_err(|error| error.into()))
        .collect()
}

/// Replace the editable fields of a recurring transaction.
///
/// The generation cursor is kept and the next due date recomputed for the new
/// schedule.
///
/// # Errors
/// Returns the validation errors of [create_recurring_transaction], or
/// [Error::UpdateMissingRecurringTransaction] if it does not exist.
pub fn update_recurring_transaction(
    id: RecurringTransactionId,
    recurring: NewRecurringTransaction,
    connection: &Connection,
) -> Result<(), Error> {
    let amount_cents = recurring.validate(connection)?;

    // Only the cursor is read so that a stored frequency that no longer
    // parses can still be corrected.
    let last_generated_date: Option<Date> = match connection.query_row(
        "SELECT last_generated_date FROM recurring_transaction WHERE id = ?1",
        [id],
        |row| row.get(0),
    ) {
        Ok(last_generated_date) => last_generated_date,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(Error::UpdateMissingRecurringTransaction);
        }
        Err(error) => return Err(error.into()),
    };

    let updated = RecurringTransaction {
        id,
        category_id: recurring.category_id,
        account_id: recurring.account_id,
        amount: recurring.amount,
        description: recurring.description.trim().to_owned(),
        frequency: recurring.frequency,
        start_date: recurring.start_date,
        end_date: recurring.end_date,
        last_generated_date,
        next_due_date: None,
        is_active: true,
    };
    let next_due_date = next_occurrence(&updated, updated.last_generated_date);

    let rows_affected = connection.execute(
        "UPDATE recurring_transaction
         SET category_id = ?1, account_id = ?2, amount_cents = ?3, description = ?4,
             frequency = ?5, start_date = ?6, end_date = ?7, next_due_date = ?8
         WHERE id = ?9",
        (
            updated.category_id,
            updated.account_id,
            amount_cents,
            &updated.description,
            updated.frequency,
            updated.start_date,
            updated.end_date,
            next_due_date,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRecurringTransaction);
    }

    Ok(())
}

/// Pause an active recurring transaction or resume a paused one.
///
/// Returns whether it is active afterwards.
pub fn toggle_recurring_transaction_active(
    id: RecurringTransactionId,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .prepare(
            "UPDATE recurring_transaction SET is_active = NOT is_active
             WHERE id = ?1 RETURNING is_active",
        )?
        .query_row([id], |row| row.get(0))
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingRecurringTransaction,
            error => error.into(),
        })
}

/// Delete a recurring transaction. Entries it generated are kept and lose
/// their link to it.
///
/// # Errors
/// Returns [Error::DeleteMissingRecurringTransaction] if it does not exist.
pub fn delete_recurring_transaction(
    id: RecurringTransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM recurring_transaction WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRecurringTransaction);
    }

    Ok(())
}

/// Move the generation cursor of a recurring transaction.
pub(crate) fn update_cursor(
    id: RecurringTransactionId,
    last_generated_date: Option<Date>,
    next_due_date: Option<Date>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE recurring_transaction SET last_generated_date = ?1, next_due_date = ?2
         WHERE id = ?3",
        (last_generated_date, next_due_date, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRecurringTransaction);
    }

    Ok(())
}

/// Create the recurring transaction table.
pub fn create_recurring_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS recurring_transaction (
            id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
            description TEXT NOT NULL DEFAULT '',
            frequency TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            last_generated_date TEXT,
            next_due_date TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY(category_id) REFERENCES category(id),
            FOREIGN KEY(account_id) REFERENCES account(id)
        );

        CREATE INDEX IF NOT EXISTS idx_recurring_transaction_next_due_date
            ON recurring_transaction(next_due_date);",
    )?;

    Ok(())
}

/// Map a database row to a [RecurringTransaction].
pub fn map_recurring_transaction_row(row: &Row) -> Result<RecurringTransaction, rusqlite::Error> {
    let amount_cents: i64 = row.get(3)?;

    Ok(RecurringTransaction {
        id: row.get(0)?,
        category_id: row.get(1)?,
        account_id: row.get(2)?,
        amount: from_cents(amount_cents),
        description: row.get(4)?,
        frequency: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        last_generated_date: row.get(8)?,
        next_due_date: row.get(9)?,
        is_active: row.get(10)?,
    })
}

#[cfg(test)]
mod recurring_transaction_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        account::create_account,
        category::{CategoryName, NewCategory, create_category, delete_category},
        db::initialize,
        ledger::{EntryFilter, Ledger, LedgerEntry, list_ledger_entries},
        recurrence::{
            Frequency, NewRecurringTransaction, create_recurring_transaction,
            delete_recurring_transaction, get_recurring_transaction, list_recurring_transactions,
            toggle_recurring_transaction_active, update_cursor, update_recurring_transaction,
        },
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn new_recurring(connection: &Connection) -> NewRecurringTransaction {
        let category = create_category(
            NewCategory::new(CategoryName::new_unchecked("Streaming")),
            connection,
        )
        .unwrap();
        let account = create_account("Credit card", connection).unwrap();

        NewRecurringTransaction {
            category_id: category.id,
            account_id: account.id,
            amount: dec!(15.99),
            description: "Music subscription".to_owned(),
            frequency: Frequency::Monthly,
            start_date: date!(2024 - 01 - 10),
            end_date: None,
        }
    }

    #[test]
    fn create_sets_first_due_date_to_start_date() {
        let connection = get_test_connection();

        let recurring = create_recurring_transaction(new_recurring(&connection), &connection)
            .expect("Could not create recurring transaction");

        assert_eq!(recurring.next_due_date, Some(date!(2024 - 01 - 10)));
        assert_eq!(recurring.last_generated_date, None);
        assert!(recurring.is_active);
        assert_eq!(
            get_recurring_transaction(recurring.id, &connection),
            Ok(recurring)
        );
    }

    #[test]
    fn create_rejects_end_before_start() {
        let connection = get_test_connection();
        let recurring = NewRecurringTransaction {
            end_date: Some(date!(2024 - 01 - 09)),
            ..new_recurring(&connection)
        };

        let result = create_recurring_transaction(recurring, &connection);

        assert_eq!(
            result,
            Err(Error::EndDateBeforeStartDate {
                start: date!(2024 - 01 - 10),
                end: date!(2024 - 01 - 09)
            })
        );
    }

    #[test]
    fn create_accepts_end_on_start() {
        let connection = get_test_connection();
        let recurring = NewRecurringTransaction {
            end_date: Some(date!(2024 - 01 - 10)),
            ..new_recurring(&connection)
        };

        assert!(create_recurring_transaction(recurring, &connection).is_ok());
    }

    #[test]
    fn create_rejects_negative_amount() {
        let connection = get_test_connection();
        let recurring = NewRecurringTransaction {
            amount: dec!(-15.99),
            ..new_recurring(&connection)
        };

        assert_eq!(
            create_recurring_transaction(recurring, &connection),
            Err(Error::NonPositiveAmount(dec!(-15.99)))
        );
    }

    #[test]
    fn unknown_stored_frequency_is_reported_until_corrected() {
        let connection = get_test_connection();
        let new = new_recurring(&connection);
        let recurring = create_recurring_transaction(new.clone(), &connection).unwrap();
        connection
            .execute(
                "UPDATE recurring_transaction SET frequency = 'FORTNIGHTLY' WHERE id = ?1",
                [recurring.id],
            )
            .unwrap();

        let result = get_recurring_transaction(recurring.id, &connection);

        assert_eq!(result, Err(Error::UnknownFrequency("FORTNIGHTLY".to_owned())));

        update_recurring_transaction(recurring.id, new, &connection).unwrap();
        assert_eq!(
            get_recurring_transaction(recurring.id, &connection).map(|fixed| fixed.frequency),
            Ok(Frequency::Monthly)
        );
    }

    #[test]
    fn update_recomputes_next_due_date_from_cursor() {
        let connection = get_test_connection();
        let new = new_recurring(&connection);
        let recurring = create_recurring_transaction(new.clone(), &connection).unwrap();
        update_cursor(
            recurring.id,
            Some(date!(2024 - 03 - 10)),
            Some(date!(2024 - 04 - 10)),
            &connection,
        )
        .unwrap();

        update_recurring_transaction(
            recurring.id,
            NewRecurringTransaction {
                frequency: Frequency::Weekly,
                ..new
            },
            &connection,
        )
        .unwrap();

        let updated = get_recurring_transaction(recurring.id, &connection).unwrap();
        assert_eq!(updated.frequency, Frequency::Weekly);
        assert_eq!(updated.last_generated_date, Some(date!(2024 - 03 - 10)));
        assert_eq!(updated.next_due_date, Some(date!(2024 - 03 - 17)));
    }

    #[test]
    fn update_with_earlier_end_date_ends_schedule() {
        let connection = get_test_connection();
        let new = new_recurring(&connection);
        let recurring = create_recurring_transaction(new.clone(), &connection).unwrap();
        update_cursor(
            recurring.id,
            Some(date!(2024 - 03 - 10)),
            Some(date!(2024 - 04 - 10)),
            &connection,
        )
        .unwrap();

        update_recurring_transaction(
            recurring.id,
            NewRecurringTransaction {
                end_date: Some(date!(2024 - 04 - 01)),
                ..new
            },
            &connection,
        )
        .unwrap();

        let updated = get_recurring_transaction(recurring.id, &connection).unwrap();
        assert_eq!(updated.next_due_date, None);
    }

    #[test]
    fn update_missing_fails() {
        let connection = get_test_connection();
        let new = new_recurring(&connection);

        assert_eq!(
            update_recurring_transaction(3, new, &connection),
            Err(Error::UpdateMissingRecurringTransaction)
        );
    }

    #[test]
    fn toggle_pauses_and_resumes() {
        let connection = get_test_connection();
        let recurring =
            create_recurring_transaction(new_recurring(&connection), &connection).unwrap();

        assert_eq!(
            toggle_recurring_transaction_active(recurring.id, &connection),
            Ok(false)
        );
        assert_eq!(list_recurring_transactions(true, &connection), Ok(vec![]));
        assert_eq!(
            list_recurring_transactions(false, &connection)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            toggle_recurring_transaction_active(recurring.id, &connection),
            Ok(true)
        );
    }

    #[test]
    fn delete_keeps_generated_entries() {
        let connection = get_test_connection();
        let new = new_recurring(&connection);
        let recurring = create_recurring_transaction(new.clone(), &connection).unwrap();
        connection
            .create_entry(
                LedgerEntry::build(
                    new.category_id,
                    new.account_id,
                    new.amount,
                    new.start_date,
                )
                .recurring_transaction(recurring.id),
            )
            .unwrap();

        assert_eq!(delete_recurring_transaction(recurring.id, &connection), Ok(()));

        let entries = list_ledger_entries(EntryFilter::default(), &connection).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].recurring_transaction_id, None);
        assert_eq!(
            delete_recurring_transaction(recurring.id, &connection),
            Err(Error::DeleteMissingRecurringTransaction)
        );
    }

    #[test]
    fn category_with_recurring_transaction_cannot_be_deleted() {
        let connection = get_test_connection();
        let new = new_recurring(&connection);
        create_recurring_transaction(new.clone(), &connection).unwrap();

        assert_eq!(
            delete_category(new.category_id, &connection),
            Err(Error::CategoryInUse("Streaming".to_owned()))
        );
    }
}
