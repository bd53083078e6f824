//! Accounts are where money is held, e.g. a bank account or a credit card.

mod core;

pub use core::{
    Account, AccountId, create_account, create_account_table, delete_account,
    get_active_account, get_account, list_accounts, map_row_to_account, toggle_account_active,
    update_account,
};
