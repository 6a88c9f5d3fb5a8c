//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, OptionalExtension, Row};
use time::{Date, PrimitiveDateTime};

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, get_category_for_user},
    recurrence::{Frequency, next_occurrence},
    transaction_type::TransactionType,
};

// ============================================================================
// MODELS
// ============================================================================

pub type TransactionId = i64;

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user who owns the transaction.
    pub user_id: UserID,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// The amount of money spent or earned, always positive.
    pub amount: f64,
    /// Whether the money was earned or spent.
    pub transaction_type: TransactionType,
    /// A text description of what the transaction was for.
    pub note: Option<String>,
    /// When the transaction happened, in local time.
    pub date: PrimitiveDateTime,
    pub is_recurring: bool,
    pub frequency: Option<Frequency>,
    /// When the next occurrence should be created, `None` if there is no schedule.
    pub next_date: Option<PrimitiveDateTime>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: f64,
        transaction_type: TransactionType,
        date: PrimitiveDateTime,
    ) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            transaction_type,
            date,
            category_id: None,
            note: None,
            is_recurring: false,
            frequency: None,
        }
    }
}

/// A transaction together with the name of its category, for display and export.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionWithCategory {
    pub transaction: Transaction,
    /// `None` if the transaction has no category.
    pub category_name: Option<String>,
}

/// A builder for creating [Transaction] instances.
///
/// The schedule is derived from the date and frequency when the transaction
/// is inserted with [create_transaction].
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub date: PrimitiveDateTime,
    pub category_id: Option<CategoryId>,
    pub note: Option<String>,
    pub is_recurring: bool,
    pub frequency: Option<Frequency>,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the note for the transaction. Blank notes are stored as `None`.
    pub fn note(mut self, note: Option<&str>) -> Self {
        self.note = note
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_owned);
        self
    }

    /// Mark the transaction as recurring.
    ///
    /// A recurring transaction without a known frequency is never scheduled.
    pub fn recurring(mut self, frequency: Option<Frequency>) -> Self {
        self.is_recurring = true;
        self.frequency = frequency;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER,
            amount REAL NOT NULL,
            type TEXT NOT NULL,
            note TEXT,
            date TEXT NOT NULL,
            is_recurring INTEGER NOT NULL DEFAULT 0,
            frequency TEXT,
            next_date TEXT,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
        )",
        (),
    )?;

    // Covers the per-user scans done on every request by the recurrence middleware.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_recurring
            ON \"transaction\"(user_id, is_recurring)",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str =
    "id, user_id, category_id, amount, type, note, date, is_recurring, frequency, next_date";

pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        transaction_type: row.get(4)?,
        note: row.get(5)?,
        date: row.get(6)?,
        is_recurring: row.get(7)?,
        frequency: row.get(8)?,
        next_date: row.get(9)?,
    })
}

/// Check that `amount` can be used as a transaction or budget amount.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `amount` is not a finite number greater than zero.
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount(amount.to_string()))
    }
}

/// Create a new transaction owned by `user_id` in the database from a builder.
///
/// Recurring transactions with a frequency are scheduled one step after their date.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::InvalidCategory] if the category does not exist or belongs to another user,
/// - [Error::CategoryTypeMismatch] if the category's type differs from the transaction's,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_amount(builder.amount)?;

    if let Some(category_id) = builder.category_id {
        let category = get_category_for_user(category_id, user_id, connection)?;

        if category.transaction_type != builder.transaction_type {
            return Err(Error::CategoryTypeMismatch);
        }
    }

    let next_date = if builder.is_recurring {
        next_occurrence(builder.frequency, builder.date)
    } else {
        None
    };

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, category_id, amount, type, note, date, is_recurring, frequency, next_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id,
                builder.category_id,
                builder.amount,
                builder.transaction_type,
                builder.note,
                builder.date,
                builder.is_recurring,
                builder.frequency,
                next_date,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get a transaction by its ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no transaction with `id`.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| error.into())
}

/// Get the recurring transactions owned by `user_id`, oldest first.
pub fn get_recurring_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
            WHERE user_id = :user_id AND is_recurring = 1
            ORDER BY id ASC"
        ))?
        .query_map(&[(":user_id", &user_id)], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Move the schedule of the transaction `id` to `next_date`.
pub fn set_next_date(
    id: TransactionId,
    next_date: Option<PrimitiveDateTime>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET next_date = ?1 WHERE id = ?2",
        (next_date, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Whether `user_id` already has a transaction with the same type, amount and note on `date`.
pub fn transaction_exists_on(
    user_id: UserID,
    transaction_type: TransactionType,
    amount: f64,
    note: &str,
    date: Date,
    connection: &Connection,
) -> Result<bool, Error> {
    let existing: Option<TransactionId> = connection
        .query_row(
            "SELECT id FROM \"transaction\"
            WHERE user_id = ?1 AND type = ?2 AND amount = ?3 AND note = ?4 AND date(date) = ?5
            LIMIT 1",
            (user_id, transaction_type, amount, note, date),
            |row| row.get(0),
        )
        .optional()?;

    Ok(existing.is_some())
}

/// Get all of the transactions owned by `user_id` with their category names, newest first.
pub fn get_transactions_with_category(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<TransactionWithCategory>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.user_id, t.category_id, t.amount, t.type, t.note, t.date,
                t.is_recurring, t.frequency, t.next_date, c.name
            FROM \"transaction\" t
            LEFT JOIN category c ON c.id = t.category_id
            WHERE t.user_id = :user_id
            ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(&[(":user_id", &user_id)], |row| {
            Ok(TransactionWithCategory {
                transaction: map_transaction_row(row)?,
                category_name: row.get(10)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Sum the expenses of `user_id` in `category_id`, regardless of date.
pub fn get_category_spend(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM \"transaction\"
            WHERE user_id = ?1 AND category_id = ?2 AND type = ?3",
            (user_id, category_id, TransactionType::Expense),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
        .map_err(|error| error.into())
}
