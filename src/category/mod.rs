//! Categories label transactions and budgets as a kind of income or expense.
//!
//! The default categories are global, users may add their own on top.

mod categories_page;
mod core;
mod create_endpoint;

pub(crate) use categories_page::type_badge;
pub use categories_page::get_categories_page;
pub use core::{
    Category, CategoryId, DEFAULT_CATEGORIES, create_category, create_category_table,
    get_categories_for_user, get_category_for_user, map_row_to_category,
    seed_default_categories,
};
pub use create_endpoint::create_category_endpoint;
