//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    admin::{
        delete_message_endpoint, delete_user_endpoint, get_admin_dashboard_page,
        get_admin_messages_page, get_admin_users_page, toggle_user_role_endpoint,
    },
    auth::{
        admin_guard, admin_guard_hx, auth_guard, auth_guard_hx, get_log_in_page, get_log_out,
        get_register_page, post_log_in, register_user,
    },
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budgets_page, get_edit_budget_page,
        update_budget_endpoint,
    },
    category::{create_category_endpoint, get_categories_page},
    contact::{get_contact_page, post_contact},
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    investment::{create_investment_endpoint, get_investments_page},
    not_found::get_404_not_found,
    recurrence::{recurrence_middleware, session_recurrence_middleware},
    transaction::{create_transaction_endpoint, export_transactions, get_transactions_page},
};

/// Return a router with all the app's routes.
///
/// Every authenticated route first passes the auth guard, then materializes the
/// user's due recurring transactions, then (for admin routes) checks the admin role.
/// Public routes materialize them too when the visitor has a valid session.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::CONTACT_VIEW, get(get_contact_page))
        .route(endpoints::POST_CONTACT, post(post_contact))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_recurrence_middleware,
        ));

    let admin_pages = Router::new()
        .route(endpoints::ADMIN_DASHBOARD_VIEW, get(get_admin_dashboard_page))
        .route(endpoints::ADMIN_USERS_VIEW, get(get_admin_users_page))
        .route(endpoints::ADMIN_MESSAGES_VIEW, get(get_admin_messages_page))
        .layer(middleware::from_fn(admin_guard));

    let protected_pages = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::EXPORT_TRANSACTIONS, get(export_transactions))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::EDIT_BUDGET_VIEW, get(get_edit_budget_page))
        .route(endpoints::INVESTMENTS_VIEW, get(get_investments_page))
        .merge(admin_pages)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            recurrence_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let admin_api = Router::new()
        .route(
            endpoints::TOGGLE_USER_ROLE,
            post(toggle_user_role_endpoint),
        )
        .route(endpoints::DELETE_USER, delete(delete_user_endpoint))
        .route(endpoints::DELETE_MESSAGE, delete(delete_message_endpoint))
        .layer(middleware::from_fn(admin_guard_hx));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_api = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(endpoints::CATEGORIES_API, post(create_category_endpoint))
        .route(endpoints::POST_BUDGET, post(create_budget_endpoint))
        .route(
            endpoints::PUT_BUDGET,
            put(update_budget_endpoint).delete(delete_budget_endpoint),
        )
        .route(endpoints::POST_INVESTMENT, post(create_investment_endpoint))
        .merge(admin_api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            recurrence_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

    protected_pages
        .merge(protected_api)
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
