//! Writes ledger entries for recurring transactions that have fallen due.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::Serialize;
use time::Date;

use crate::{
    Clock, Error,
    ledger::Ledger,
    recurrence::{
        RecurringTransactionId, advance, get_recurring_transaction, list_active_recurring_ids,
        update_cursor,
    },
};

/// A recurring transaction that could not be brought up to date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDefinition {
    /// The ID of the recurring transaction.
    pub id: RecurringTransactionId,
    /// Why it failed.
    pub error: String,
}

/// What a single run of [generate_due_entries] did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Occurrences on or before this date were generated.
    pub reference_date: Date,
    /// How many active recurring transactions were looked at.
    pub processed: usize,
    /// How many ledger entries were created.
    pub generated: usize,
    /// How many due occurrences already had a matching entry.
    pub skipped_duplicates: usize,
    /// Recurring transactions with a frequency that is not recognised. They
    /// are skipped on every run until corrected.
    pub stalled: Vec<RecurringTransactionId>,
    /// Recurring transactions that hit an error part way through. Occurrences
    /// before the failing one are kept.
    pub failed: Vec<FailedDefinition>,
}

impl RunSummary {
    fn new(reference_date: Date) -> Self {
        Self {
            reference_date,
            processed: 0,
            generated: 0,
            skipped_duplicates: 0,
            stalled: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Create a ledger entry for every occurrence of every active recurring
/// transaction that is due on or before today.
///
/// Each occurrence is applied in its own database transaction: the duplicate
/// check, the new entry and the cursor update are committed together, so
/// running this twice on the same day creates nothing the second time.
/// An occurrence that already has an entry with the same category, account,
/// amount, description and date is skipped but still moves the cursor.
///
/// An error in one recurring transaction is logged and recorded in the
/// summary, and the remaining recurring transactions are still processed.
///
/// # Errors
/// Returns an [Error::SqlError] only if the recurring transactions cannot be
/// listed at all.
pub fn generate_due_entries(
    connection: &Connection,
    clock: &impl Clock,
) -> Result<RunSummary, Error> {
    let reference_date = clock.today();
    let mut summary = RunSummary::new(reference_date);

    for id in list_active_recurring_ids(connection)? {
        summary.processed += 1;

        match generate_for_recurring_transaction(id, reference_date, connection, &mut summary) {
            Ok(()) => {}
            Err(Error::UnknownFrequency(frequency)) => {
                tracing::warn!(
                    "Skipping recurring transaction {id}: unknown frequency \"{frequency}\""
                );
                summary.stalled.push(id);
            }
            Err(error) => {
                tracing::error!("Could not generate entries for recurring transaction {id}: {error}");
                summary.failed.push(FailedDefinition {
                    id,
                    error: error.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Generated {} entries for {} recurring transactions up to {reference_date} \
         ({} duplicates skipped, {} stalled, {} failed)",
        summary.generated,
        summary.processed,
        summary.skipped_duplicates,
        summary.stalled.len(),
        summary.failed.len()
    );

    Ok(summary)
}

fn generate_for_recurring_transaction(
    id: RecurringTransactionId,
    reference_date: Date,
    connection: &Connection,
    summary: &mut RunSummary,
) -> Result<(), Error> {
    let recurring = get_recurring_transaction(id, connection)?;
    let due = advance(&recurring, reference_date);

    if due.occurrences.is_empty() {
        if due.next_due_date != recurring.next_due_date {
            update_cursor(
                id,
                recurring.last_generated_date,
                due.next_due_date,
                connection,
            )?;
            tracing::debug!(
                "Moved next due date of recurring transaction {id} to {:?}",
                due.next_due_date
            );
        }

        return Ok(());
    }

    for occurrence in due.occurrences {
        let date = occurrence.last_generated_date;
        let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

        let created = if transaction.find_matching(&occurrence.entry)? {
            false
        } else {
            match transaction.create_entry(occurrence.entry) {
                Ok(_) => true,
                Err(Error::DuplicateOccurrence(_, _)) => false,
                Err(error) => return Err(error),
            }
        };

        update_cursor(id, Some(date), occurrence.next_due_date, &transaction)?;
        transaction.commit()?;

        if created {
            summary.generated += 1;
            tracing::info!("Generated entry for recurring transaction {id} on {date}");
        } else {
            summary.skipped_duplicates += 1;
            tracing::debug!(
                "Recurring transaction {id} already has an entry on {date}, moved cursor only"
            );
        }
    }

    Ok(())
}
