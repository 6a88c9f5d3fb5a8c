//! Defines the budget model and its database queries.

use rusqlite::{Connection, Row};
use time::{Date, PrimitiveDateTime};

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, get_category_for_user},
    transaction::validate_amount,
};

pub type BudgetId = i64;

/// A spending limit on one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserID,
    pub category_id: CategoryId,
    pub name: String,
    /// The most the user wants to spend.
    pub amount: f64,
    /// A label for how often the budget resets, e.g. "monthly".
    pub period: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub created_at: PrimitiveDateTime,
}

/// A budget together with the name of its category.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetWithCategory {
    pub budget: Budget,
    pub category_name: String,
}

/// The fields needed to create a budget.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub name: String,
    pub amount: f64,
    pub period: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub category_id: CategoryId,
}

/// The fields a user may change on an existing budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetUpdate {
    pub name: String,
    pub amount: f64,
    pub period: String,
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                period TEXT NOT NULL,
                start_date TEXT,
                end_date TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_user ON budget(user_id)",
        (),
    )?;

    Ok(())
}

const BUDGET_COLUMNS: &str =
    "id, user_id, category_id, name, amount, period, start_date, end_date, created_at";

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        name: row.get(3)?,
        amount: row.get(4)?,
        period: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn validate_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        Err(Error::EmptyBudgetName)
    } else {
        Ok(name.to_owned())
    }
}

fn validate_period(period: &str) -> Result<String, Error> {
    let period = period.trim();

    if period.is_empty() {
        Err(Error::MissingField("period"))
    } else {
        Ok(period.to_owned())
    }
}

/// Create a budget owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyBudgetName] if the name is blank,
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::MissingField] if the period is blank,
/// - [Error::InvalidCategory] if the category is not visible to the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    new_budget: NewBudget,
    user_id: UserID,
    created_at: PrimitiveDateTime,
    connection: &Connection,
) -> Result<Budget, Error> {
    let name = validate_name(&new_budget.name)?;
    let amount = validate_amount(new_budget.amount)?;
    let period = validate_period(&new_budget.period)?;
    get_category_for_user(new_budget.category_id, user_id, connection)?;

    let budget = connection
        .prepare(&format!(
            "INSERT INTO budget
                (user_id, category_id, name, amount, period, start_date, end_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                user_id,
                new_budget.category_id,
                name,
                amount,
                period,
                new_budget.start_date,
                new_budget.end_date,
                created_at,
            ),
            map_budget_row,
        )?;

    Ok(budget)
}

/// Get the budgets owned by `user_id` with their category names, oldest first.
pub fn get_budgets_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<BudgetWithCategory>, Error> {
    connection
        .prepare(
            "SELECT b.id, b.user_id, b.category_id, b.name, b.amount, b.period,
                b.start_date, b.end_date, b.created_at, c.name
            FROM budget b
            INNER JOIN category c ON c.id = b.category_id
            WHERE b.user_id = :user_id
            ORDER BY b.id ASC",
        )?
        .query_map(&[(":user_id", &user_id)], |row| {
            Ok(BudgetWithCategory {
                budget: map_budget_row(row)?,
                category_name: row.get(9)?,
            })
        })?
        .map(|maybe_budget| maybe_budget.map_err(|error| error.into()))
        .collect()
}

/// Get the budget `id` if it is owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the budget does not exist, or [Error::Forbidden]
/// if it belongs to another user.
pub fn get_owned_budget(
    id: BudgetId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!("SELECT {BUDGET_COLUMNS} FROM budget WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_budget_row)?;

    if budget.user_id != user_id {
        tracing::warn!("User {user_id} tried to access budget {id} owned by another user");
        return Err(Error::Forbidden);
    }

    Ok(budget)
}

/// Change the name, amount and period of a budget owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingBudget] if the budget does not exist,
/// - [Error::Forbidden] if the budget belongs to another user,
/// - a validation error if one of the new values is invalid,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_budget(
    id: BudgetId,
    user_id: UserID,
    update: BudgetUpdate,
    connection: &Connection,
) -> Result<Budget, Error> {
    match get_owned_budget(id, user_id, connection) {
        Err(Error::NotFound) => return Err(Error::UpdateMissingBudget),
        Err(error) => return Err(error),
        Ok(_) => {}
    }

    let name = validate_name(&update.name)?;
    let amount = validate_amount(update.amount)?;
    let period = validate_period(&update.period)?;

    connection
        .prepare(&format!(
            "UPDATE budget SET name = ?1, amount = ?2, period = ?3 WHERE id = ?4
            RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row((name, amount, period, id), map_budget_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingBudget,
            error => error.into(),
        })
}

/// Delete a budget owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingBudget] if the budget does not exist,
/// - [Error::Forbidden] if the budget belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    match get_owned_budget(id, user_id, connection) {
        Err(Error::NotFound) => return Err(Error::DeleteMissingBudget),
        Err(error) => return Err(error),
        Ok(_) => {}
    }

    let rows_affected = connection.execute("DELETE FROM budget WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}
