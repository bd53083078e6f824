//! Savings goals linked to a savings category.

mod core;
mod progress;

pub use core::{
    Goal, GoalId, NewGoal, create_goal, create_goal_table, delete_goal, get_category_total,
    get_goal, list_goals, update_goal,
};
pub use progress::{GoalFilter, GoalProgress, GoalStatus, goal_progress, list_goal_progress};
