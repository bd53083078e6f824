//! How far along each savings goal is.

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    goal::{Goal, get_category_total, list_goals},
    money::percent_of,
};

/// Where a goal stands relative to its target amount and date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum GoalStatus {
    /// The target amount has been reached.
    Completed,
    /// Not reached yet, with this many days left until the target date.
    InProgress {
        /// Zero on the target date itself.
        days_remaining: i64,
    },
    /// Not reached and the target date has passed this many days ago.
    Overdue {
        /// Always positive.
        days: i64,
    },
}

/// A goal together with its progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    /// The goal.
    pub goal: Goal,
    /// The total saved so far in the linked category.
    pub current_amount: Decimal,
    /// The current amount as a percentage of the target. May exceed 100.
    pub progress_percent: Decimal,
    /// Whether the goal is completed, on track or overdue.
    pub status: GoalStatus,
}

impl GoalProgress {
    /// Days from `today` until the target date, negative once it has passed.
    pub fn days_until_target(&self, today: Date) -> i64 {
        (self.goal.target_date - today).whole_days()
    }

    /// Whether the target amount has been reached.
    pub fn is_completed(&self) -> bool {
        self.status == GoalStatus::Completed
    }
}

/// Which goals [list_goal_progress] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalFilter {
    /// Goals whose target has not been reached.
    #[default]
    Active,
    /// Goals whose target has been reached.
    Completed,
    /// Every goal.
    All,
}

/// Work out the progress of `goal` given the amount saved so far.
pub fn goal_progress(goal: Goal, current_amount: Decimal, today: Date) -> GoalProgress {
    let days_diff = (goal.target_date - today).whole_days();

    let status = if current_amount >= goal.target_amount {
        GoalStatus::Completed
    } else if days_diff < 0 {
        GoalStatus::Overdue { days: -days_diff }
    } else {
        GoalStatus::InProgress {
            days_remaining: days_diff,
        }
    };

    GoalProgress {
        progress_percent: percent_of(current_amount, goal.target_amount),
        current_amount,
        goal,
        status,
    }
}

/// Get the progress of the goals matching `filter`, nearest target date first.
pub fn list_goal_progress(
    filter: GoalFilter,
    today: Date,
    connection: &Connection,
) -> Result<Vec<GoalProgress>, Error> {
    let mut progress = Vec::new();

    for goal in list_goals(connection)? {
        let current_amount = get_category_total(goal.linked_category_id, connection)?;
        let item = goal_progress(goal, current_amount, today);

        let include = match filter {
            GoalFilter::Active => !item.is_completed(),
            GoalFilter::Completed => item.is_completed(),
            GoalFilter::All => true,
        };

        if include {
            progress.push(item);
        }
    }

    progress.sort_by_key(|item| item.days_until_target(today));

    Ok(progress)
}
