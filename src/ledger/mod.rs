//! Ledger entries and transfers.
//!
//! This module contains everything related to recording money:
//! - The `LedgerEntry` model and `NewLedgerEntry` builder for income and expenses
//! - The [Ledger] trait that generated entries are written through
//! - Transfers between accounts, which are neither income nor expense

mod core;
mod store;
mod transfer;

pub use core::{
    EntryFilter, EntryId, LedgerEntry, NewLedgerEntry, create_ledger_entry,
    create_ledger_entry_table, delete_ledger_entry, get_ledger_entry, list_ledger_entries,
    map_ledger_entry_row, update_ledger_entry,
};
pub(crate) use core::ENTRY_COLUMNS;
pub use store::Ledger;
pub use transfer::{
    NewTransfer, Transfer, TransferId, create_transfer, create_transfer_table, delete_transfer,
    get_transfer, list_transfers, update_transfer,
};
