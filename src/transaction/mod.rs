//! Transactions, the incomes and expenses recorded by each user.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing and querying transactions
//! - The transaction listing, the create endpoint and the CSV export

mod core;
mod create_endpoint;
mod export;
mod transactions_page;

pub use core::{
    Transaction, TransactionBuilder, TransactionId, TransactionWithCategory, create_transaction,
    create_transaction_table, get_category_spend, get_recurring_transactions, get_transaction,
    get_transactions_with_category, map_transaction_row, set_next_date, transaction_exists_on,
    validate_amount,
};
pub use create_endpoint::{CreateTransactionState, TransactionForm, create_transaction_endpoint};
pub use export::{ExportTransactionsState, export_transactions, write_transactions_csv};
pub use transactions_page::{TransactionsPageState, TransactionsQuery, get_transactions_page};

#[cfg(test)]
pub use core::count_transactions;
