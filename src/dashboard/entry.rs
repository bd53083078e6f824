//! Database queries for the entries the dashboard aggregates.
//!
//! The dashboard only needs the amount, the date and a few category fields of
//! each entry, so it reads this narrow view instead of full ledger entries.

use std::ops::RangeInclusive;

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    category::{BudgetBucket, CategoryId, CategoryKind},
    money::from_cents,
};

/// An entry joined with the category fields used for aggregation.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct DashboardEntry {
    pub amount: Decimal,
    pub date: Date,
    pub category_id: CategoryId,
    pub category_name: String,
    pub kind: CategoryKind,
    pub bucket: BudgetBucket,
    pub category_is_active: bool,
}

/// Gets the entries whose competence date falls within `date_range`, oldest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(super) fn get_entries_in_date_range(
    date_range: RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<DashboardEntry>, Error> {
    connection
        .prepare(
            "SELECT e.amount_cents, e.competence_date, c.id, c.name, c.kind, c.bucket, c.is_active
             FROM ledger_entry e
             INNER JOIN category c ON c.id = e.category_id
             WHERE e.competence_date BETWEEN ?1 AND ?2
             ORDER BY e.competence_date ASC, e.id ASC",
        )?
        .query_map((date_range.start(), date_range.end()), map_dashboard_entry_row)?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

/// The all-time income minus the all-time expenses.
pub(super) fn get_total_balance(connection: &Connection) -> Result<Decimal, Error> {
    let cents: i64 = connection.query_row(
        "SELECT COALESCE(SUM(CASE WHEN c.kind = 'income' THEN e.amount_cents
                                  ELSE -e.amount_cents END), 0)
         FROM ledger_entry e
         INNER JOIN category c ON c.id = e.category_id",
        [],
        |row| row.get(0),
    )?;

    Ok(from_cents(cents))
}

fn map_dashboard_entry_row(row: &Row) -> Result<DashboardEntry, rusqlite::Error> {
    let cents: i64 = row.get(0)?;

    Ok(DashboardEntry {
        amount: from_cents(cents),
        date: row.get(1)?,
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        kind: row.get(4)?,
        bucket: row.get(5)?,
        category_is_active: row.get(6)?,
    })
}
