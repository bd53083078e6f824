//! Assembles the dashboard summary from the ledger and the goals.

use std::ops::RangeInclusive;

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, Duration};

use crate::{
    Error,
    calendar::{month_bounds, previous_month},
    category::CategoryKind,
    dashboard::{
        aggregation::{
            BucketReport, CategoryExpense, MonthlyTotals, budget_rule, expenses_by_category,
            last_months, monthly_totals, profit, sum_by_kind,
        },
        entry::{DashboardEntry, get_entries_in_date_range, get_total_balance},
    },
    goal::{GoalFilter, GoalProgress, list_goal_progress},
    ledger::{EntryFilter, LedgerEntry, list_ledger_entries},
};

/// The number of days covered by [default_date_range].
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

const MONTHS_SHOWN: usize = 6;
const UPCOMING_GOALS_SHOWN: usize = 3;
const RECENT_ENTRIES_SHOWN: u32 = 5;

/// Everything shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// The first day of the period the period totals cover.
    pub period_start: Date,
    /// The last day of the period the period totals cover.
    pub period_end: Date,
    /// All-time income minus all-time expenses.
    pub total_balance: Decimal,
    /// Income in the period.
    pub period_income: Decimal,
    /// Expenses in the period.
    pub period_expenses: Decimal,
    /// Income and expenses for the last six months, oldest first.
    pub monthly_totals: Vec<MonthlyTotals>,
    /// Spending per expense category in the period, largest first.
    pub expenses_by_category: Vec<CategoryExpense>,
    /// The 50/30/20 report for the period.
    pub budget_rule: Vec<BucketReport>,
    /// Income minus expenses in the current month.
    pub current_month_profit: Decimal,
    /// Income minus expenses in the previous month.
    pub previous_month_profit: Decimal,
    /// Whether the previous month has any entries to compare against.
    pub has_previous_month_data: bool,
    /// The uncompleted goals with the nearest target dates.
    pub upcoming_goals: Vec<GoalProgress>,
    /// The most recent entries.
    pub recent_entries: Vec<LedgerEntry>,
}

/// The last 30 days, ending with `today`.
pub fn default_date_range(today: Date) -> RangeInclusive<Date> {
    today - Duration::days(DEFAULT_PERIOD_DAYS)..=today
}

/// Build the dashboard for the entries in `date_range`.
///
/// The monthly chart, the month-over-month profit and the goal statuses are
/// relative to `today` rather than to the range.
///
/// # Errors
/// Returns [Error::SqlError] if any of the queries fail.
pub fn get_dashboard_summary(
    date_range: RangeInclusive<Date>,
    today: Date,
    connection: &Connection,
) -> Result<DashboardSummary, Error> {
    let period_entries = get_entries_in_date_range(date_range.clone(), connection)?;
    let period_income = sum_by_kind(&period_entries, CategoryKind::Income);
    let period_expenses = sum_by_kind(&period_entries, CategoryKind::Expense);

    let months = last_months(today, MONTHS_SHOWN);
    let (_, end_of_month) = month_bounds(today);
    let chart_start = months.first().copied().unwrap_or(end_of_month);
    let chart_entries = get_entries_in_date_range(chart_start..=end_of_month, connection)?;

    let current_month_entries = entries_in(&chart_entries, month_bounds(today));
    let previous_month_entries =
        entries_in(&chart_entries, month_bounds(previous_month(today)));

    let mut upcoming_goals = list_goal_progress(GoalFilter::Active, today, connection)?;
    upcoming_goals.truncate(UPCOMING_GOALS_SHOWN);

    let recent_entries = list_ledger_entries(
        EntryFilter {
            limit: Some(RECENT_ENTRIES_SHOWN),
            ..Default::default()
        },
        connection,
    )?;

    Ok(DashboardSummary {
        period_start: *date_range.start(),
        period_end: *date_range.end(),
        total_balance: get_total_balance(connection)?,
        period_income,
        period_expenses,
        monthly_totals: monthly_totals(&chart_entries, &months),
        expenses_by_category: expenses_by_category(&period_entries, period_income),
        budget_rule: budget_rule(&period_entries, period_income),
        current_month_profit: profit(&current_month_entries),
        previous_month_profit: profit(&previous_month_entries),
        has_previous_month_data: !previous_month_entries.is_empty(),
        upcoming_goals,
        recent_entries,
    })
}

fn entries_in(entries: &[DashboardEntry], (first, last): (Date, Date)) -> Vec<DashboardEntry> {
    entries
        .iter()
        .filter(|entry| entry.date >= first && entry.date <= last)
        .cloned()
        .collect()
}
