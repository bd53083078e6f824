//! A personal finance tracker.
//!
//! Records income and expense entries against categories and accounts, splits
//! installment purchases into dated entries, materializes recurring
//! transactions, tracks savings goals and summarizes spending against the
//! 50/30/20 budgeting rule.
//!
//! The crate owns the domain logic and the SQLite persistence. Request
//! handling and rendering are left to whichever front end embeds it.

#![warn(missing_docs)]

use rust_decimal::Decimal;
use time::Date;

pub mod account;
pub mod app_state;
pub mod calendar;
pub mod category;
pub mod clock;
pub mod dashboard;
pub mod database_id;
pub mod db;
pub mod goal;
pub mod installment;
pub mod ledger;
pub mod logging;
pub mod money;
pub mod recurrence;

pub use app_state::AppState;
pub use clock::{Clock, FixedClock, SystemClock};
pub use db::initialize as initialize_db;

use crate::{
    account::AccountId, category::CategoryId, database_id::DatabaseId,
    recurrence::FrequencyError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An installment plan must be split into at least two installments.
    #[error("an installment plan needs at least 2 installments, got {0}")]
    TooFewInstallments(u32),

    /// Monetary amounts must be greater than zero.
    #[error("{0} is not a positive amount")]
    NonPositiveAmount(Decimal),

    /// Monetary amounts are stored in cents, so at most two fractional digits
    /// are allowed.
    #[error("{0} has more than two decimal places")]
    TooManyDecimalPlaces(Decimal),

    /// The text could not be parsed as a decimal amount.
    #[error("could not parse \"{0}\" as an amount")]
    InvalidAmount(String),

    /// The amount does not fit in the range that can be stored.
    #[error("the amount {0} is too large")]
    AmountOutOfRange(Decimal),

    /// The text could not be parsed as a calendar date.
    #[error("could not parse \"{0}\" as a date, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A recurring transaction cannot end before it starts.
    #[error("the end date {end} is before the start date {start}")]
    EndDateBeforeStartDate {
        /// The first date of the recurrence.
        start: Date,
        /// The requested last date of the recurrence.
        end: Date,
    },

    /// An empty string was used as a name.
    #[error("name cannot be empty")]
    EmptyName,

    /// A transfer must move money between two different accounts.
    #[error("cannot transfer from an account to itself")]
    SameAccountTransfer,

    /// A stored recurring transaction has a frequency this version does not
    /// understand. The definition is skipped until it is corrected.
    #[error("\"{0}\" is not a known frequency")]
    UnknownFrequency(String),

    /// The category ID does not refer to an active category.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// The account ID does not refer to an active account.
    #[error("the account ID {0} does not refer to a valid account")]
    InvalidAccount(AccountId),

    /// Goals must be linked to an active expense category in the savings bucket.
    #[error("the category ID {0} is not an active savings category")]
    InvalidGoalCategory(CategoryId),

    /// The category is referenced by entries, plans, recurring transactions or
    /// goals and cannot be deleted. Archive it instead.
    #[error("the category \"{0}\" cannot be deleted because it is in use")]
    CategoryInUse(String),

    /// The account is referenced by entries, transfers, plans or recurring
    /// transactions and cannot be deleted. Archive it instead.
    #[error("the account \"{0}\" cannot be deleted because it is in use")]
    AccountInUse(String),

    /// The specified account name already exists in the database.
    #[error("the account \"{0}\" already exists in the database")]
    DuplicateAccountName(String),

    /// An entry for this recurring transaction already exists on the
    /// competence date.
    #[error("recurring transaction {0} already has an entry on {1}")]
    DuplicateOccurrence(DatabaseId, Date),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The canonical timezone name is not known.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Tried to update a ledger entry that does not exist
    #[error("tried to update a ledger entry that is not in the database")]
    UpdateMissingEntry,

    /// Tried to delete a ledger entry that does not exist
    #[error("tried to delete a ledger entry that is not in the database")]
    DeleteMissingEntry,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update a transfer that does not exist
    #[error("tried to update a transfer that is not in the database")]
    UpdateMissingTransfer,

    /// Tried to delete a transfer that does not exist
    #[error("tried to delete a transfer that is not in the database")]
    DeleteMissingTransfer,

    /// Tried to update an installment plan that does not exist
    #[error("tried to update an installment plan that is not in the database")]
    UpdateMissingInstallmentPlan,

    /// Tried to delete an installment plan that does not exist
    #[error("tried to delete an installment plan that is not in the database")]
    DeleteMissingInstallmentPlan,

    /// Tried to update a recurring transaction that does not exist
    #[error("tried to update a recurring transaction that is not in the database")]
    UpdateMissingRecurringTransaction,

    /// Tried to delete a recurring transaction that does not exist
    #[error("tried to delete a recurring transaction that is not in the database")]
    DeleteMissingRecurringTransaction,

    /// Tried to update a goal that does not exist
    #[error("tried to update a goal that is not in the database")]
    UpdateMissingGoal,

    /// Tried to delete a goal that does not exist
    #[error("tried to delete a goal that is not in the database")]
    DeleteMissingGoal,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            rusqlite::Error::FromSqlConversionFailure(column, data_type, inner) => {
                match inner.downcast::<FrequencyError>() {
                    Ok(frequency_error) => Error::UnknownFrequency(frequency_error.0),
                    Err(inner) => {
                        let error =
                            rusqlite::Error::FromSqlConversionFailure(column, data_type, inner);
                        tracing::error!("an unhandled SQL error occurred: {}", error);
                        Error::SqlError(error)
                    }
                }
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// Returns `true` if `error` is SQLite reporting a failed FOREIGN KEY constraint.
pub(crate) fn is_foreign_key_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        )
    )
}

/// Returns `true` if `error` is SQLite reporting a failed UNIQUE constraint.
pub(crate) fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        )
    )
}
