//! Recurring transactions and the generator that turns their due occurrences
//! into ledger entries.

mod core;
mod frequency;
mod generate;
mod scheduler;

pub use core::{
    NewRecurringTransaction, RecurringTransaction, RecurringTransactionId,
    create_recurring_transaction, create_recurring_transaction_table,
    delete_recurring_transaction, get_recurring_transaction, list_recurring_transactions,
    map_recurring_transaction_row, toggle_recurring_transaction_active,
    update_recurring_transaction,
};
pub(crate) use core::{list_active_recurring_ids, update_cursor};
pub use frequency::{Frequency, FrequencyError};
pub use generate::{FailedDefinition, RunSummary, generate_due_entries};
pub use scheduler::{Advance, Occurrence, advance, next_occurrence};
