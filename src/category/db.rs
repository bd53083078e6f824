//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName, NewCategory},
    db::StatusFilter,
    is_foreign_key_violation,
};

const CATEGORY_COLUMNS: &str = "id, name, kind, classification, bucket, is_active";

/// Create an active category and return it with its generated ID.
pub fn create_category(category: NewCategory, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO category (name, kind, classification, bucket, is_active)
             VALUES (?1, ?2, ?3, ?4, 1)
             RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (
                category.name.as_ref(),
                category.kind,
                category.classification,
                category.bucket,
            ),
            map_category_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a single category by ID, whether or not it is active.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = :id;"
        ))?
        .query_row(&[(":id", &category_id)], map_category_row)
        .map_err(|error| error.into())
}

/// Look up a category that new records may reference.
///
/// # Errors
/// Returns [Error::InvalidCategory] if the category does not exist or is archived.
pub fn get_active_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    match get_category(category_id, connection) {
        Ok(category) if category.is_active => Ok(category),
        Ok(_) | Err(Error::NotFound) => Err(Error::InvalidCategory(category_id)),
        Err(error) => Err(error),
    }
}

/// Retrieve categories ordered by kind (income first) and then name.
pub fn list_categories(
    filter: StatusFilter,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE {} ORDER BY kind DESC, name ASC;",
            filter.condition()
        ))?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Replace the editable fields of a category. The active flag is left as is.
pub fn update_category(
    category_id: CategoryId,
    category: NewCategory,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, kind = ?2, classification = ?3, bucket = ?4 WHERE id = ?5",
        (
            category.name.as_ref(),
            category.kind,
            category.classification,
            category.bucket,
            category_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Archive an active category or restore an archived one.
///
/// Returns whether the category is active afterwards.
pub fn toggle_category_active(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<bool, Error> {
    let is_active = connection
        .prepare("UPDATE category SET is_active = NOT is_active WHERE id = ?1 RETURNING is_active")?
        .query_row([category_id], |row| row.get(0))
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingCategory,
            error => error.into(),
        })?;

    tracing::info!(
        "Category {category_id} is now {}",
        if is_active { "active" } else { "archived" }
    );

    Ok(is_active)
}

/// Delete a category that nothing refers to.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingCategory] if the category does not exist,
/// - [Error::CategoryInUse] if entries, installment plans, recurring
///   transactions or goals still refer to it,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let category = match get_category(category_id, connection) {
        Ok(category) => category,
        Err(Error::NotFound) => return Err(Error::DeleteMissingCategory),
        Err(error) => return Err(error),
    };

    if is_category_referenced(category_id, connection)? {
        return Err(Error::CategoryInUse(category.name.to_string()));
    }

    connection
        .execute("DELETE FROM category WHERE id = ?1", [category_id])
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                Error::CategoryInUse(category.name.to_string())
            } else {
                error.into()
            }
        })?;

    Ok(())
}

fn is_category_referenced(category_id: CategoryId, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM ledger_entry WHERE category_id = ?1)
                 OR EXISTS (SELECT 1 FROM installment_plan WHERE category_id = ?1)
                 OR EXISTS (SELECT 1 FROM recurring_transaction WHERE category_id = ?1)
                 OR EXISTS (SELECT 1 FROM goal WHERE linked_category_id = ?1)",
            [category_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'expense',
            classification TEXT NOT NULL DEFAULT 'C',
            bucket TEXT NOT NULL DEFAULT 'not-applicable',
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_category_kind_name ON category(kind, name);",
    )?;

    Ok(())
}

/// Map a database row to a [Category].
pub fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);
    let kind = row.get(2)?;
    let classification = row.get(3)?;
    let bucket = row.get(4)?;
    let is_active = row.get(5)?;

    Ok(Category {
        id,
        name,
        kind,
        classification,
        bucket,
        is_active,
    })
}
