//! Categories group ledger entries into income and expense types and assign
//! spending to a 50/30/20 budget bucket.

mod db;
mod domain;

pub use db::{
    create_category, create_category_table, delete_category, get_active_category, get_category,
    list_categories, map_category_row, toggle_category_active, update_category,
};
pub use domain::{
    BudgetBucket, Category, CategoryId, CategoryKind, CategoryName, Classification, NewCategory,
};
