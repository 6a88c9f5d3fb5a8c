//! Pure calculations over a snapshot of a user's transactions.
//!
//! Nothing in this module reads from or writes to the database.

mod budget_progress;
mod date_filter;
mod totals;

pub use budget_progress::BudgetProgress;
pub use date_filter::{DateFilter, DateRange, FORM_DATE_FORMAT, parse_form_date};
pub use totals::{CategoryExpense, MonthlySeries, Totals, expenses_by_category};
