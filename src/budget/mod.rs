//! Budgets, spending limits on a category, and the pages for managing them.

mod budgets_page;
mod core;
mod create_endpoint;
mod edit_endpoint;
mod edit_page;

pub use budgets_page::{
    BudgetOverview, BudgetSummary, BudgetsPageState, get_budget_overview, get_budgets_page,
};
pub use core::{
    Budget, BudgetId, BudgetUpdate, BudgetWithCategory, NewBudget, create_budget,
    create_budget_table, delete_budget, get_budgets_for_user, get_owned_budget, update_budget,
};
pub use create_endpoint::{BudgetForm, CreateBudgetState, create_budget_endpoint};
pub use edit_endpoint::{
    EditBudgetForm, EditBudgetState, delete_budget_endpoint, update_budget_endpoint,
};
pub use edit_page::{EditBudgetPageState, get_edit_budget_page};
