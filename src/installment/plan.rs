//! Installment plans and the ledger entries they generate.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    account::{AccountId, get_active_account},
    category::{CategoryId, get_active_category},
    database_id::DatabaseId,
    installment::{Installment, expand},
    ledger::{ENTRY_COLUMNS, Ledger, LedgerEntry, map_ledger_entry_row},
    money::{from_cents, to_cents, validate_amount},
};

/// Database identifier for an installment plan.
pub type InstallmentPlanId = DatabaseId;

/// The smallest number of installments a plan can be split into.
pub const MIN_INSTALLMENTS: u32 = 2;

/// A purchase paid for in equal monthly installments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallmentPlan {
    /// The ID of the plan.
    pub id: InstallmentPlanId,
    /// What was bought.
    pub description: String,
    /// The full price, split across the installments.
    pub total_amount: Decimal,
    /// How many monthly installments the price is split into.
    pub installment_count: u32,
    /// The date of the first installment.
    pub first_date: Date,
    /// The category every installment is recorded under.
    pub category_id: CategoryId,
    /// The account every installment is paid from.
    pub account_id: AccountId,
}

/// The fields needed to create or edit an installment plan.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInstallmentPlan {
    /// What was bought.
    pub description: String,
    /// The full price.
    pub total_amount: Decimal,
    /// How many monthly installments to split the price into.
    pub installment_count: u32,
    /// The date of the first installment.
    pub first_date: Date,
    /// The category every installment is recorded under.
    pub category_id: CategoryId,
    /// The account every installment is paid from.
    pub account_id: AccountId,
}

impl NewInstallmentPlan {
    /// Check the plan and split it into its installments.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::TooFewInstallments] if the count is less than two,
    /// - [Error::NonPositiveAmount] or [Error::TooManyDecimalPlaces] for an
    ///   invalid total, or if the total is too small to give every
    ///   installment a positive amount,
    /// - [Error::InvalidDate] if the last installment falls after the last
    ///   supported date,
    /// - [Error::InvalidCategory] or [Error::InvalidAccount] if the references
    ///   are not active.
    pub fn validate(&self, connection: &Connection) -> Result<Vec<Installment>, Error> {
        if self.installment_count < MIN_INSTALLMENTS {
            return Err(Error::TooFewInstallments(self.installment_count));
        }

        validate_amount(self.total_amount)?;

        let installments = expand(self.total_amount, self.installment_count, self.first_date)
            .ok_or_else(|| Error::InvalidDate(self.first_date.to_string()))?;

        get_active_category(self.category_id, connection)?;
        get_active_account(self.account_id, connection)?;

        match installments
            .iter()
            .find(|installment| installment.amount <= Decimal::ZERO)
        {
            Some(installment) => Err(Error::NonPositiveAmount(installment.amount)),
            None => Ok(installments),
        }
    }

    fn entry_description(&self, number: u32) -> String {
        format!(
            "{} ({number}/{})",
            self.description.trim(),
            self.installment_count
        )
    }
}

/// Create an installment plan and one ledger entry per installment.
///
/// The plan and its entries are written in a single transaction.
///
/// # Errors
/// Returns the errors of [NewInstallmentPlan::validate] or an
/// [Error::SqlError] if the plan could not be saved.
pub fn create_installment_plan(
    plan: NewInstallmentPlan,
    connection: &Connection,
) -> Result<InstallmentPlan, Error> {
    let installments = plan.validate(connection)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    let created = transaction
        .prepare(
            "INSERT INTO installment_plan
                (description, total_cents, installment_count, first_date, category_id, account_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, description, total_cents, installment_count, first_date,
                category_id, account_id",
        )?
        .query_row(
            (
                plan.description.trim(),
                to_cents(plan.total_amount)?,
                plan.installment_count,
                plan.first_date,
                plan.category_id,
                plan.account_id,
            ),
            map_installment_plan_row,
        )?;

    write_installments(&transaction, created.id, &plan, &installments)?;
    transaction.commit()?;

    tracing::info!(
        "Created installment plan {} with {} installments",
        created.id,
        installments.len()
    );

    Ok(created)
}

/// Replace a plan and regenerate all of its installments.
///
/// The old entries are deleted and the new ones written in the same
/// transaction, so a failure leaves the previous installments in place.
///
/// # Errors
/// Returns the errors of [NewInstallmentPlan::validate], or
/// [Error::UpdateMissingInstallmentPlan] if the plan does not exist.
pub fn update_installment_plan(
    id: InstallmentPlanId,
    plan: NewInstallmentPlan,
    connection: &Connection,
) -> Result<(), Error> {
    let installments = plan.validate(connection)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    let rows_affected = transaction.execute(
        "UPDATE installment_plan
         SET description = ?1, total_cents = ?2, installment_count = ?3, first_date = ?4,
             category_id = ?5, account_id = ?6
         WHERE id = ?7",
        (
            plan.description.trim(),
            to_cents(plan.total_amount)?,
            plan.installment_count,
            plan.first_date,
            plan.category_id,
            plan.account_id,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingInstallmentPlan);
    }

    let deleted = transaction.delete_entries_for_plan(id)?;
    write_installments(&transaction, id, &plan, &installments)?;
    transaction.commit()?;

    tracing::info!(
        "Regenerated installment plan {id}: replaced {deleted} entries with {}",
        installments.len()
    );

    Ok(())
}

/// Delete a plan together with its installment entries.
///
/// # Errors
/// Returns [Error::DeleteMissingInstallmentPlan] if the plan does not exist.
pub fn delete_installment_plan(id: InstallmentPlanId, connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    let deleted = transaction.delete_entries_for_plan(id)?;
    let rows_affected = transaction.execute("DELETE FROM installment_plan WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingInstallmentPlan);
    }

    transaction.commit()?;

    tracing::info!("Deleted installment plan {id} and {deleted} entries");

    Ok(())
}

/// Retrieve an installment plan by its ID.
pub fn get_installment_plan(
    id: InstallmentPlanId,
    connection: &Connection,
) -> Result<InstallmentPlan, Error> {
    connection
        .prepare(
            "SELECT id, description, total_cents, installment_count, first_date,
                category_id, account_id
             FROM installment_plan WHERE id = ?1",
        )?
        .query_row([id], map_installment_plan_row)
        .map_err(|error| error.into())
}

/// Get all installment plans, most recent first date first.
pub fn list_installment_plans(connection: &Connection) -> Result<Vec<InstallmentPlan>, Error> {
    connection
        .prepare(
            "SELECT id, description, total_cents, installment_count, first_date,
                category_id, account_id
             FROM installment_plan ORDER BY first_date DESC, id DESC",
        )?
        .query_map([], map_installment_plan_row)?
        .map(|maybe_plan| maybe_plan.map_err(|error| error.into()))
        .collect()
}

/// Get the ledger entries of a plan in installment order.
pub fn get_plan_installments(
    id: InstallmentPlanId,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entry
             WHERE installment_plan_id = ?1
             ORDER BY installment_number ASC"
        ))?
        .query_map([id], map_ledger_entry_row)?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

fn write_installments(
    connection: &Connection,
    plan_id: InstallmentPlanId,
    plan: &NewInstallmentPlan,
    installments: &[Installment],
) -> Result<(), Error> {
    for installment in installments {
        connection.create_entry(
            LedgerEntry::build(
                plan.category_id,
                plan.account_id,
                installment.amount,
                installment.date,
            )
            .description(&plan.entry_description(installment.number))
            .installment(plan_id, installment.number),
        )?;
    }

    Ok(())
}

/// Create the installment plan table.
pub fn create_installment_plan_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS installment_plan (
            id INTEGER PRIMARY KEY,
            description TEXT NOT NULL DEFAULT '',
            total_cents INTEGER NOT NULL CHECK (total_cents > 0),
            installment_count INTEGER NOT NULL CHECK (installment_count >= 2),
            first_date TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            FOREIGN KEY(category_id) REFERENCES category(id),
            FOREIGN KEY(account_id) REFERENCES account(id)
        )",
        (),
    )?;

    Ok(())
}

fn map_installment_plan_row(row: &Row) -> Result<InstallmentPlan, rusqlite::Error> {
    let id = row.get(0)?;
    let description = row.get(1)?;
    let total_cents: i64 = row.get(2)?;
    let installment_count = row.get(3)?;
    let first_date = row.get(4)?;
    let category_id = row.get(5)?;
    let account_id = row.get(6)?;

    Ok(InstallmentPlan {
        id,
        description,
        total_amount: from_cents(total_cents),
        installment_count,
        first_date,
        category_id,
        account_id,
    })
}
