//! Savings goals and their database queries.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    category::{BudgetBucket, CategoryId, CategoryKind, get_category},
    database_id::DatabaseId,
    money::{from_cents, to_cents, validate_amount},
};

/// Database identifier for a goal.
pub type GoalId = DatabaseId;

/// An amount to save by a target date.
///
/// Progress is measured by the total of the entries in the linked category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Goal {
    /// The ID of the goal.
    pub id: GoalId,
    /// What the money is for.
    pub name: String,
    /// How much to save.
    pub target_amount: Decimal,
    /// When the money should be saved by.
    pub target_date: Date,
    /// The savings category whose entries count towards the goal.
    pub linked_category_id: CategoryId,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// The fields needed to create or edit a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    /// What the money is for.
    pub name: String,
    /// How much to save.
    pub target_amount: Decimal,
    /// When the money should be saved by.
    pub target_date: Date,
    /// An active expense category in the savings bucket.
    pub linked_category_id: CategoryId,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl NewGoal {
    fn validate(&self, connection: &Connection) -> Result<(String, i64), Error> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        validate_amount(self.target_amount)?;

        match get_category(self.linked_category_id, connection) {
            Ok(category)
                if category.is_active
                    && category.kind == CategoryKind::Expense
                    && category.bucket == BudgetBucket::Savings => {}
            Ok(_) | Err(Error::NotFound) => {
                return Err(Error::InvalidGoalCategory(self.linked_category_id));
            }
            Err(error) => return Err(error),
        }

        Ok((name.to_owned(), to_cents(self.target_amount)?))
    }

    fn notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
    }
}

/// Create a goal.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if the name is blank,
/// - [Error::NonPositiveAmount] or [Error::TooManyDecimalPlaces] for an invalid target,
/// - [Error::InvalidGoalCategory] if the linked category is not an active
///   expense category in the savings bucket,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_goal(goal: NewGoal, connection: &Connection) -> Result<Goal, Error> {
    let (name, target_cents) = goal.validate(connection)?;

    connection
        .prepare(
            "INSERT INTO goal (name, target_cents, target_date, linked_category_id, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, name, target_cents, target_date, linked_category_id, notes",
        )?
        .query_row(
            (
                name,
                target_cents,
                goal.target_date,
                goal.linked_category_id,
                goal.notes(),
            ),
            map_goal_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a goal by its ID.
pub fn get_goal(id: GoalId, connection: &Connection) -> Result<Goal, Error> {
    connection
        .prepare(
            "SELECT id, name, target_cents, target_date, linked_category_id, notes
             FROM goal WHERE id = ?1",
        )?
        .query_row([id], map_goal_row)
        .map_err(|error| error.into())
}

/// Get every goal, soonest target date first.
pub fn list_goals(connection: &Connection) -> Result<Vec<Goal>, Error> {
    connection
        .prepare(
            "SELECT id, name, target_cents, target_date, linked_category_id, notes
             FROM goal ORDER BY target_date ASC, id ASC",
        )?
        .query_map([], map_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(|error| error.into()))
        .collect()
}

/// Replace every field of a goal, validated as in [create_goal].
pub fn update_goal(id: GoalId, goal: NewGoal, connection: &Connection) -> Result<(), Error> {
    let (name, target_cents) = goal.validate(connection)?;

    let rows_affected = connection.execute(
        "UPDATE goal
         SET name = ?1, target_cents = ?2, target_date = ?3, linked_category_id = ?4, notes = ?5
         WHERE id = ?6",
        (
            name,
            target_cents,
            goal.target_date,
            goal.linked_category_id,
            goal.notes(),
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingGoal);
    }

    Ok(())
}

/// Delete a goal. The entries of its category are not affected.
pub fn delete_goal(id: GoalId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM goal WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingGoal);
    }

    Ok(())
}

/// The total of every entry in `category_id`, regardless of date.
pub fn get_category_total(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Decimal, Error> {
    let cents: i64 = connection.query_row(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM ledger_entry WHERE category_id = ?1",
        [category_id],
        |row| row.get(0),
    )?;

    Ok(from_cents(cents))
}

/// Create the goal table.
pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goal (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            target_cents INTEGER NOT NULL CHECK (target_cents > 0),
            target_date TEXT NOT NULL,
            linked_category_id INTEGER NOT NULL,
            notes TEXT,
            FOREIGN KEY(linked_category_id) REFERENCES category(id)
        )",
        (),
    )?;

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<Goal, rusqlite::Error> {
    let target_cents: i64 = row.get(2)?;

    Ok(Goal {
        id: row.get(0)?,
        name: row.get(1)?,
        target_amount: from_cents(target_cents),
        target_date: row.get(3)?,
        linked_category_id: row.get(4)?,
        notes: row.get(5)?,
    })
}

#[cfg(test)]
mod goal_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        account::create_account,
        category::{
            BudgetBucket, Category, CategoryKind, CategoryName, NewCategory, create_category,
            delete_category, toggle_category_active,
        },
        db::initialize,
        goal::{
            NewGoal, create_goal, delete_goal, get_category_total, get_goal, list_goals,
            update_goal,
        },
        ledger::{LedgerEntry, create_ledger_entry},
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn create_savings_category(connection: &Connection) -> Category {
        create_category(
            NewCategory::new(CategoryName::new_unchecked("Emergency fund"))
                .kind(CategoryKind::Expense)
                .bucket(BudgetBucket::Savings),
            connection,
        )
        .unwrap()
    }

    fn new_goal(category: &Category) -> NewGoal {
        NewGoal {
            name: "Emergency fund".to_owned(),
            target_amount: dec!(5000),
            target_date: date!(2024 - 12 - 31),
            linked_category_id: category.id,
            notes: Some("  ".to_owned()),
        }
    }

    #[test]
    fn create_goal_succeeds() {
        let connection = get_test_connection();
        let category = create_savings_category(&connection);

        let goal = create_goal(new_goal(&category), &connection).unwrap();

        assert_eq!(goal.target_amount, dec!(5000));
        assert_eq!(goal.notes, None);
        assert_eq!(get_goal(goal.id, &connection), Ok(goal));
    }

    #[test]
    fn create_goal_rejects_non_savings_category() {
        let connection = get_test_connection();
        let category = create_category(
            NewCategory::new(CategoryName::new_unchecked("Rent"))
                .bucket(BudgetBucket::Essentials),
            &connection,
        )
        .unwrap();

        let result = create_goal(new_goal(&category), &connection);

        assert_eq!(result, Err(Error::InvalidGoalCategory(category.id)));
    }

    #[test]
    fn create_goal_rejects_archived_category() {
        let connection = get_test_connection();
        let category = create_savings_category(&connection);
        toggle_category_active(category.id, &connection).unwrap();

        let result = create_goal(new_goal(&category), &connection);

        assert_eq!(result, Err(Error::InvalidGoalCategory(category.id)));
    }

    #[test]
    fn create_goal_rejects_empty_name() {
        let connection = get_test_connection();
        let category = create_savings_category(&connection);

        let result = create_goal(
            NewGoal {
                name: " ".to_owned(),
                ..new_goal(&category)
            },
            &connection,
        );

        assert_eq!(result, Err(Error::EmptyName));
    }

    #[test]
    fn update_and_delete_goal() {
        let connection = get_test_connection();
        let category = create_savings_category(&connection);
        let goal = create_goal(new_goal(&category), &connection).unwrap();

        update_goal(
            goal.id,
            NewGoal {
                target_amount: dec!(7500.50),
                notes: Some("Six months of expenses".to_owned()),
                ..new_goal(&category)
            },
            &connection,
        )
        .unwrap();
        let updated = get_goal(goal.id, &connection).unwrap();
        assert_eq!(updated.target_amount, dec!(7500.50));
        assert_eq!(updated.notes.as_deref(), Some("Six months of expenses"));

        assert_eq!(delete_goal(goal.id, &connection), Ok(()));
        assert_eq!(list_goals(&connection), Ok(vec![]));
        assert_eq!(delete_goal(goal.id, &connection), Err(Error::DeleteMissingGoal));
    }

    #[test]
    fn update_missing_goal_fails() {
        let connection = get_test_connection();
        let category = create_savings_category(&connection);

        assert_eq!(
            update_goal(5, new_goal(&category), &connection),
            Err(Error::UpdateMissingGoal)
        );
    }

    #[test]
    fn category_total_sums_all_entries() {
        let connection = get_test_connection();
        let category = create_savings_category(&connection);
        let account = create_account("Savings", &connection).unwrap();
        assert_eq!(get_category_total(category.id, &connection), Ok(Decimal::ZERO));

        for (amount, date) in [
            (dec!(100.10), date!(2023 - 01 - 01)),
            (dec!(200.20), date!(2024 - 01 - 01)),
        ] {
            create_ledger_entry(
                LedgerEntry::build(category.id, account.id, amount, date),
                &connection,
            )
            .unwrap();
        }

        assert_eq!(get_category_total(category.id, &connection), Ok(dec!(300.30)));
    }

    #[test]
    fn category_with_goal_cannot_be_deleted() {
        let connection = get_test_connection();
        let category = create_savings_category(&connection);
        create_goal(new_goal(&category), &connection).unwrap();

        assert_eq!(
            delete_category(category.id, &connection),
            Err(Error::CategoryInUse("Emergency fund".to_owned()))
        );
    }
}
