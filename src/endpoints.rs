//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/budgets/{budget_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying a user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The route for downloading a user's transactions as a CSV file.
pub const EXPORT_TRANSACTIONS: &str = "/transactions/export";
/// The page for listing and creating categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for listing and creating budgets.
pub const BUDGETS_VIEW: &str = "/budgets";
/// The page for editing an existing budget.
pub const EDIT_BUDGET_VIEW: &str = "/budgets/{budget_id}/edit";
/// The page for listing and creating investments.
pub const INVESTMENTS_VIEW: &str = "/investments";
/// The public page for sending a message to the admins.
pub const CONTACT_VIEW: &str = "/contact";
/// The landing page for admins.
pub const ADMIN_DASHBOARD_VIEW: &str = "/admin";
/// The page for managing users.
pub const ADMIN_USERS_VIEW: &str = "/admin/users";
/// The page for reading contact messages.
pub const ADMIN_MESSAGES_VIEW: &str = "/admin/messages";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route to access static files such as scripts and stylesheets.
pub const STATIC: &str = "/static";

/// The route for a little easter egg.
pub const COFFEE: &str = "/coffee";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for logging out a user.
pub const LOG_OUT: &str = "/log_out";
/// The route for registering a new user.
pub const USERS: &str = "/api/users";
/// The route for creating a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route for creating a category.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route for creating a budget.
pub const POST_BUDGET: &str = "/api/budgets";
/// The route for updating a budget.
pub const PUT_BUDGET: &str = "/api/budgets/{budget_id}";
/// The route for deleting a budget.
pub const DELETE_BUDGET: &str = "/api/budgets/{budget_id}";
/// The route for creating an investment.
pub const POST_INVESTMENT: &str = "/api/investments";
/// The route for sending a contact message.
pub const POST_CONTACT: &str = "/api/contact";
/// The route for switching a user between the user and admin roles.
pub const TOGGLE_USER_ROLE: &str = "/api/admin/users/{user_id}/role";
/// The route for deleting a user.
pub const DELETE_USER: &str = "/api/admin/users/{user_id}";
/// The route for deleting a contact message.
pub const DELETE_MESSAGE: &str = "/api/admin/messages/{message_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// Only the first parameter, e.g. `{budget_id}`, is replaced.
/// If there is no parameter, `endpoint_path` is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
