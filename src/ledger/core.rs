//! Defines the ledger entry model and its database queries.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    account::{AccountId, get_active_account},
    category::{CategoryId, CategoryKind, get_active_category},
    database_id::DatabaseId,
    installment::InstallmentPlanId,
    money::{from_cents, to_cents, validate_amount},
    recurrence::RecurringTransactionId,
};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for a ledger entry.
pub type EntryId = DatabaseId;

/// Money earned or spent, recorded against a category and an account.
///
/// Whether an entry is income or an expense is decided by its category, so
/// amounts are always positive.
///
/// To create a new `LedgerEntry`, use [LedgerEntry::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    /// The ID of the entry.
    pub id: EntryId,
    /// The category the entry belongs to.
    pub category_id: CategoryId,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// The positive amount with at most two fractional digits.
    pub amount: Decimal,
    /// What the entry was for. May be empty.
    pub description: String,
    /// The date the income or expense belongs to, used for all reporting.
    pub competence_date: Date,
    /// When the money actually moved, if it has.
    pub payment_date: Option<Date>,
    /// The installment plan that generated this entry.
    pub installment_plan_id: Option<InstallmentPlanId>,
    /// The position of this entry in its installment plan, starting at 1.
    pub installment_number: Option<u32>,
    /// The recurring transaction that generated this entry.
    pub recurring_transaction_id: Option<RecurringTransactionId>,
}

impl LedgerEntry {
    /// Create a new ledger entry.
    ///
    /// Shortcut for [NewLedgerEntry] for discoverability.
    pub fn build(
        category_id: CategoryId,
        account_id: AccountId,
        amount: Decimal,
        competence_date: Date,
    ) -> NewLedgerEntry {
        NewLedgerEntry {
            category_id,
            account_id,
            amount,
            description: String::new(),
            competence_date,
            payment_date: None,
            installment_plan_id: None,
            installment_number: None,
            recurring_transaction_id: None,
        }
    }
}

/// A ledger entry that has not been saved yet.
///
/// Optional fields default to `None` and the description to an empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    /// The category the entry belongs to.
    pub category_id: CategoryId,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// The positive amount with at most two fractional digits.
    pub amount: Decimal,
    /// What the entry was for.
    pub description: String,
    /// The date the income or expense belongs to.
    pub competence_date: Date,
    /// When the money actually moved.
    pub payment_date: Option<Date>,
    /// The installment plan that generated this entry.
    pub installment_plan_id: Option<InstallmentPlanId>,
    /// The position of this entry in its installment plan.
    pub installment_number: Option<u32>,
    /// The recurring transaction that generated this entry.
    pub recurring_transaction_id: Option<RecurringTransactionId>,
}

impl NewLedgerEntry {
    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.trim().to_owned();
        self
    }

    /// Set the payment date.
    pub fn payment_date(mut self, payment_date: Option<Date>) -> Self {
        self.payment_date = payment_date;
        self
    }

    /// Mark the entry as installment `number` of the plan `plan_id`.
    pub fn installment(mut self, plan_id: InstallmentPlanId, number: u32) -> Self {
        self.installment_plan_id = Some(plan_id);
        self.installment_number = Some(number);
        self
    }

    /// Mark the entry as generated by a recurring transaction.
    pub fn recurring_transaction(mut self, recurring_transaction_id: RecurringTransactionId) -> Self {
        self.recurring_transaction_id = Some(recurring_transaction_id);
        self
    }
}

/// Narrows down the entries returned by [list_ledger_entries].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Only entries whose category has this kind.
    pub kind: Option<CategoryKind>,
    /// Only entries with a competence date on or after this date.
    pub from: Option<Date>,
    /// Only entries with a competence date on or before this date.
    pub to: Option<Date>,
    /// Return at most this many entries.
    pub limit: Option<u32>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub(crate) const ENTRY_COLUMNS: &str = "id, category_id, account_id, amount_cents, description, \
    competence_date, payment_date, installment_plan_id, installment_number, recurring_transaction_id";

/// Create a ledger entry entered by the user.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] or [Error::TooManyDecimalPlaces] for invalid amounts,
/// - [Error::InvalidCategory] if the category does not exist or is archived,
/// - [Error::InvalidAccount] if the account does not exist or is archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_ledger_entry(
    entry: NewLedgerEntry,
    connection: &Connection,
) -> Result<LedgerEntry, Error> {
    validate_entry(&entry, connection)?;

    connection
        .prepare(&format!(
            "INSERT INTO ledger_entry (category_id, account_id, amount_cents, description,
                competence_date, payment_date, installment_plan_id, installment_number,
                recurring_transaction_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {ENTRY_COLUMNS}"
        ))?
        .query_row(
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
            map_ledger_entry_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a ledger entry by its ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no entry with `id`.
pub fn get_ledger_entry(id: EntryId, connection: &Connection) -> Result<LedgerEntry, Error> {
    connection
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entry WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_ledger_entry_row)
        .map_err(|error| error.into())
}

/// Replace the user-editable fields of an entry.
///
/// Links to installment plans and recurring transactions are kept.
///
/// # Errors
/// Returns the validation errors of [create_ledger_entry], or
/// [Error::UpdateMissingEntry] if the entry does not exist.
pub fn update_ledger_entry(
    id: EntryId,
    entry: NewLedgerEntry,
    connection: &Connection,
) -> Result<(), Error> {
    validate_entry(&entry, connection)?;

    let rows_affected = connection.execute(
        "UPDATE ledger_entry
         SET category_id = ?1, account_id = ?2, amount_cents = ?3, description = ?4,
             competence_date = ?5, payment_date = ?6
         WHERE id = ?7",
        (
            entry.category_id,
            entry.account_id,
            to_cents(entry.amount)?,
            &entry.description,
            entry.competence_date,
            entry.payment_date,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingEntry);
    }

    Ok(())
}

/// Delete a single ledger entry.
///
/// # Errors
/// Returns [Error::DeleteMissingEntry] if the entry does not exist.
pub fn delete_ledger_entry(id: EntryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM ledger_entry WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingEntry);
    }

    Ok(())
}

/// Get ledger entries matching `filter`, newest competence date first.
pub fn list_ledger_entries(
    filter: EntryFilter,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS}
             FROM ledger_entry
             WHERE (?1 IS NULL OR category_id IN (SELECT id FROM category WHERE kind = ?1))
               AND (?2 IS NULL OR competence_date >= ?2)
               AND (?3 IS NULL OR competence_date <= ?3)
             ORDER BY competence_date DESC, id DESC
             LIMIT ?4"
        ))?
        .query_map(
            (
                filter.kind,
                filter.from,
                filter.to,
                filter.limit.map_or(-1, i64::from),
            ),
            map_ledger_entry_row,
        )?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

fn validate_entry(entry: &NewLedgerEntry, connection: &Connection) -> Result<(), Error> {
    validate_amount(entry.amount)?;
    get_active_category(entry.category_id, connection)?;
    get_active_account(entry.account_id, connection)?;

    Ok(())
}

/// Create the ledger entry table.
///
/// Installment entries are removed with their plan. Entries generated by a
/// recurring transaction outlive it. A recurring transaction has at most one
/// entry per competence date.
pub fn create_ledger_entry_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS ledger_entry (
            id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
            description TEXT NOT NULL DEFAULT '',
            competence_date TEXT NOT NULL,
            payment_date TEXT,
            installment_plan_id INTEGER,
            installment_number INTEGER,
            recurring_transaction_id INTEGER,
            FOREIGN KEY(category_id) REFERENCES category(id),
            FOREIGN KEY(account_id) REFERENCES account(id),
            FOREIGN KEY(installment_plan_id) REFERENCES installment_plan(id) ON DELETE CASCADE,
            FOREIGN KEY(recurring_transaction_id) REFERENCES recurring_transaction(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ledger_entry_competence_date
            ON ledger_entry(competence_date);

        CREATE INDEX IF NOT EXISTS idx_ledger_entry_installment_plan
            ON ledger_entry(installment_plan_id);

        CREATE UNIQUE INDEX IF NOT EXISTS idx_ledger_entry_recurrence_date
            ON ledger_entry(recurring_transaction_id, competence_date)
            WHERE recurring_transaction_id IS NOT NULL;",
    )?;

    Ok(())
}

/// Map a database row to a [LedgerEntry].
///
/// The columns must be in the order of `ENTRY_COLUMNS`.
pub fn map_ledger_entry_row(row: &Row) -> Result<LedgerEntry, rusqlite::Error> {
    let id = row.get(0)?;
    let category_id = row.get(1)?;
    let account_id = row.get(2)?;
    let amount_cents: i64 = row.get(3)?;
    let description = row.get(4)?;
    let competence_date = row.get(5)?;
    let payment_date = row.get(6)?;
    let installment_plan_id = row.get(7)?;
    let installment_number = row.get(8)?;
    let recurring_transaction_id = row.get(9)?;

    Ok(LedgerEntry {
        id,
        category_id,
        account_id,
        amount: from_cents(amount_cents),
        description,
        competence_date,
        payment_date,
        installment_plan_id,
        installment_number,
        recurring_transaction_id,
    })
}
