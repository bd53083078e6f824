//! Entry aggregation for the dashboard.
//!
//! Sums entries by month, by expense category and by budget bucket. These
//! functions are pure so the date and percentage edge cases can be tested
//! without a database.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    calendar::{first_day_of_month, previous_month},
    category::{BudgetBucket, CategoryId, CategoryKind},
    dashboard::entry::DashboardEntry,
    money::{percent_of, round_to_cents},
};

/// Income and expenses for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    /// The first day of the month.
    pub month: Date,
    /// Total income in the month.
    pub income: Decimal,
    /// Total expenses in the month.
    pub expenses: Decimal,
}

/// The spending in one expense category over the dashboard period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryExpense {
    /// The category the spending was recorded against.
    pub category_id: CategoryId,
    /// The name of the category.
    pub name: String,
    /// The total spent.
    pub total: Decimal,
    /// The total as a percentage of the period income.
    pub percent_of_income: Decimal,
}

/// How the spending in one budget bucket compares to its 50/30/20 target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketReport {
    /// The budget bucket.
    pub bucket: BudgetBucket,
    /// The amount spent in active categories of the bucket.
    pub spent: Decimal,
    /// The bucket's share of the period income.
    pub target: Decimal,
    /// The amount spent as a percentage of the period income.
    pub percent_of_income: Decimal,
    /// The amount spent as a percentage of the target.
    pub percent_of_target: Decimal,
}

/// Sums the entries whose category is of `kind`.
pub(super) fn sum_by_kind(entries: &[DashboardEntry], kind: CategoryKind) -> Decimal {
    entries
        .iter()
        .filter(|entry| entry.kind == kind)
        .map(|entry| entry.amount)
        .sum()
}

/// Income minus expenses.
pub(super) fn profit(entries: &[DashboardEntry]) -> Decimal {
    sum_by_kind(entries, CategoryKind::Income) - sum_by_kind(entries, CategoryKind::Expense)
}

/// The first days of the `count` months ending with the month of `today`,
/// oldest first.
pub(super) fn last_months(today: Date, count: usize) -> Vec<Date> {
    let mut months = Vec::with_capacity(count);
    let mut month = first_day_of_month(today);

    for _ in 0..count {
        months.push(month);
        month = previous_month(month);
    }

    months.reverse();
    months
}

/// Totals income and expenses for each of `months`.
///
/// Every month gets a row, with zeros when it has no entries. Entries outside
/// `months` are ignored.
pub(super) fn monthly_totals(entries: &[DashboardEntry], months: &[Date]) -> Vec<MonthlyTotals> {
    let mut totals: HashMap<Date, (Decimal, Decimal)> = HashMap::new();

    for entry in entries {
        let (income, expenses) = totals.entry(first_day_of_month(entry.date)).or_default();

        match entry.kind {
            CategoryKind::Income => *income += entry.amount,
            CategoryKind::Expense => *expenses += entry.amount,
        }
    }

    months
        .iter()
        .map(|&month| {
            let (income, expenses) = totals.get(&month).copied().unwrap_or_default();
            MonthlyTotals {
                month,
                income,
                expenses,
            }
        })
        .collect()
}

/// Groups expense entries by category, largest total first.
pub(super) fn expenses_by_category(
    entries: &[DashboardEntry],
    income: Decimal,
) -> Vec<CategoryExpense> {
    let mut totals: BTreeMap<CategoryId, (&str, Decimal)> = BTreeMap::new();

    for entry in entries
        .iter()
        .filter(|entry| entry.kind == CategoryKind::Expense)
    {
        totals
            .entry(entry.category_id)
            .or_insert((entry.category_name.as_str(), Decimal::ZERO))
            .1 += entry.amount;
    }

    let mut expenses: Vec<CategoryExpense> = totals
        .into_iter()
        .filter(|(_, (_, total))| *total > Decimal::ZERO)
        .map(|(category_id, (name, total))| CategoryExpense {
            category_id,
            name: name.to_owned(),
            total,
            percent_of_income: percent_of(total, income),
        })
        .collect();

    expenses.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    expenses
}

/// Compares the spending in each budgeted bucket to its share of `income`.
///
/// Only expense entries in active categories count. With no income every
/// target and percentage is zero.
pub(super) fn budget_rule(entries: &[DashboardEntry], income: Decimal) -> Vec<BucketReport> {
    BudgetBucket::BUDGETED
        .into_iter()
        .map(|bucket| {
            let spent: Decimal = entries
                .iter()
                .filter(|entry| {
                    entry.kind == CategoryKind::Expense
                        && entry.category_is_active
                        && entry.bucket == bucket
                })
                .map(|entry| entry.amount)
                .sum();

            let target = bucket
                .target_percent()
                .map(|percent| round_to_cents(income * Decimal::from(percent) / Decimal::ONE_HUNDRED))
                .unwrap_or_default();

            BucketReport {
                bucket,
                spent,
                target,
                percent_of_income: percent_of(spent, income),
                percent_of_target: percent_of(spent, target),
            }
        })
        .collect()
}
