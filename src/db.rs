//! Creates the application's tables and seeds the default categories.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    auth::create_user_table,
    budget::create_budget_table,
    category::{create_category_table, seed_default_categories},
    contact::create_contact_message_table,
    investment::create_investment_table,
    transaction::create_transaction_table,
};

/// Create all the tables used by the application and insert the default categories.
///
/// This function is idempotent, so it is safe to call on an existing database.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    // Foreign key enforcement is per connection and cannot be changed inside a transaction.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_investment_table(&transaction)?;
    create_contact_message_table(&transaction)?;

    seed_default_categories(&transaction)?;

    transaction.commit()?;

    Ok(())
}
