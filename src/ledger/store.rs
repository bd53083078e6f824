//! The append and query interface used by installment plans and recurring
//! transactions to write ledger entries.

use rusqlite::Connection;

use crate::{
    Error,
    installment::InstallmentPlanId,
    is_unique_violation,
    ledger::{EntryId, NewLedgerEntry},
    money::to_cents,
};

/// Storage for generated ledger entries.
///
/// Callers are expected to have validated the category and account of the
/// entries they write, so implementations only enforce referential integrity.
pub trait Ledger {
    /// Whether an entry with the same category, account, amount, description
    /// and competence date already exists.
    fn find_matching(&self, entry: &NewLedgerEntry) -> Result<bool, Error>;

    /// Append `entry` and return its ID.
    ///
    /// # Errors
    /// Returns [Error::DuplicateOccurrence] if the entry belongs to a recurring
    /// transaction that already has an entry on the same competence date.
    fn create_entry(&self, entry: NewLedgerEntry) -> Result<EntryId, Error>;

    /// Delete every entry generated by the installment plan `plan_id` and
    /// return how many were removed.
    fn delete_entries_for_plan(&self, plan_id: InstallmentPlanId) -> Result<usize, Error>;
}

impl Ledger for Connection {
    fn find_matching(&self, entry: &NewLedgerEntry) -> Result<bool, Error> {
        self.query_row(
            "SELECT EXISTS (
                SELECT 1 FROM ledger_entry
                WHERE category_id = ?1
                  AND account_id = ?2
                  AND amount_cents = ?3
                  AND description = ?4
                  AND competence_date = ?5
            )",
            (
                entry.category_id,
                entry.account_id,
                to_cents(entry.amount)?,
                &entry.description,
                entry.competence_date,
            ),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
    }

    fn create_entry(&self, entry: NewLedgerEntry) -> Result<EntryId, Error> {
        self.execute(
            "INSERT INTO ledger_entry (category_id, account_id, amount_cents, description,
                competence_date, payment_date, installment_plan_id, installment_number,
                recurring_transaction_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            (
                entry.category_id,
                entry.account_id,
                to_cents(entry.amount)?,
                &entry.description,
                entry.competence_date,
                entry.payment_date,
                entry.installment_plan_id,
                entry.installment_number,
                entry.recurring_transaction_id,
            ),
        )
        .map_err(|error| match entry.recurring_transaction_id {
            Some(recurring_transaction_id) if is_unique_violation(&error) => {
                Error::DuplicateOccurrence(recurring_transaction_id, entry.competence_date)
            }
            _ => error.into(),
        })?;

        Ok(self.last_insert_rowid())
    }

    fn delete_entries_for_plan(&self, plan_id: InstallmentPlanId) -> Result<usize, Error> {
        self.execute(
            "DELETE FROM ledger_entry WHERE installment_plan_id = ?1",
            [plan_id],
        )
        .map_err(|error| error.into())
    }
}

#[cfg(test)]
mod ledger_store_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        account::create_account,
        category::{CategoryName, NewCategory, create_category},
        db::initialize,
        ledger::{Ledger, LedgerEntry, NewLedgerEntry, get_ledger_entry},
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn build_entry(connection: &Connection) -> NewLedgerEntry {
        let category = create_category(
            NewCategory::new(CategoryName::new_unchecked("Rent")),
            connection,
        )
        .unwrap();
        let account = create_account("Checking", connection).unwrap();

        LedgerEntry::build(category.id, account.id, dec!(1500), date!(2024 - 05 - 01))
            .description("Monthly rent")
    }

    #[test]
    fn find_matching_is_false_for_empty_ledger() {
        let connection = get_test_connection();
        let entry = build_entry(&connection);

        assert_eq!(connection.find_matching(&entry), Ok(false));
    }

    #[test]
    fn find_matching_finds_created_entry() {
        let connection = get_test_connection();
        let entry = build_entry(&connection);

        let id = connection.create_entry(entry.clone()).unwrap();

        assert!(id > 0);
        assert_eq!(connection.find_matching(&entry), Ok(true));
    }

    #[test]
    fn find_matching_compares_every_field() {
        let connection = get_test_connection();
        let entry = build_entry(&connection);
        connection.create_entry(entry.clone()).unwrap();

        let different_amount = NewLedgerEntry {
            amount: dec!(1500.01),
            ..entry.clone()
        };
        let different_date = NewLedgerEntry {
            competence_date: date!(2024 - 06 - 01),
            ..entry.clone()
        };
        let different_description = entry.clone().description("Rent");

        assert_eq!(connection.find_matching(&different_amount), Ok(false));
        assert_eq!(connection.find_matching(&different_date), Ok(false));
        assert_eq!(connection.find_matching(&different_description), Ok(false));
    }

    #[test]
    fn create_entry_stores_all_fields() {
        let connection = get_test_connection();
        let entry = build_entry(&connection);

        let id = connection.create_entry(entry.clone()).unwrap();

        let stored = get_ledger_entry(id, &connection).unwrap();
        assert_eq!(stored.category_id, entry.category_id);
        assert_eq!(stored.amount, dec!(1500));
        assert_eq!(stored.description, "Monthly rent");
        assert_eq!(stored.competence_date, date!(2024 - 05 - 01));
        assert_eq!(stored.payment_date, None);
    }

    #[test]
    fn create_entry_rejects_second_occurrence_on_same_date() {
        let connection = get_test_connection();
        let entry = build_entry(&connection);
        connection
            .execute(
                "INSERT INTO recurring_transaction (category_id, account_id, amount_cents,
                    description, frequency, start_date, next_due_date)
                 VALUES (?1, ?2, 150000, 'Monthly rent', 'MONTHLY', '2024-05-01', '2024-05-01')",
                (entry.category_id, entry.account_id),
            )
            .unwrap();
        let recurring_id = connection.last_insert_rowid();
        let entry = entry.recurring_transaction(recurring_id);
        connection.create_entry(entry.clone()).unwrap();

        let result = connection.create_entry(entry.description("Changed description"));

        assert_eq!(
            result,
            Err(Error::DuplicateOccurrence(recurring_id, date!(2024 - 05 - 01)))
        );
    }
}
