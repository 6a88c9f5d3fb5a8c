//! The admin page for promoting, demoting and deleting users.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Error,
    admin::AdminState,
    alert::Alert,
    auth::{Principal, Role, User, UserID, delete_user, get_all_users, get_user_by_id, set_user_role},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, delete_action_button,
    },
    navigation::NavBar,
};

fn role_badge(role: Role) -> Markup {
    let style = if role.is_admin() {
        "inline-flex items-center px-2.5 py-0.5 rounded text-xs font-medium \
        bg-purple-100 text-purple-800 dark:bg-purple-900 dark:text-purple-300"
    } else {
        "inline-flex items-center px-2.5 py-0.5 rounded text-xs font-medium \
        bg-gray-100 text-gray-800 dark:bg-gray-700 dark:text-gray-300"
    };

    html!( span class=(style) { (role) } )
}

/// A table of users. Action buttons are only shown when `current_user` is given,
/// and the current user cannot delete themselves.
pub(super) fn users_table(users: &[User], current_user: Option<UserID>) -> Markup {
    html! {
        div class="overflow-x-auto dark:bg-gray-800"
        {
            table id="users" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Username" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Email" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Role" }

                        @if current_user.is_some() {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }
                }

                tbody
                {
                    @for user in users {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class=(TABLE_CELL_STYLE) { (user.username) }
                            td class=(TABLE_CELL_STYLE) { (user.email) }
                            td class=(TABLE_CELL_STYLE) { (role_badge(user.role)) }

                            @if let Some(current_user) = current_user {
                                td class=(TABLE_CELL_STYLE) { (user_actions(user, current_user)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn user_actions(user: &User, current_user: UserID) -> Markup {
    let toggle_url = format_endpoint(endpoints::TOGGLE_USER_ROLE, user.id.as_i64());
    let delete_url = format_endpoint(endpoints::DELETE_USER, user.id.as_i64());
    let toggle_label = if user.role.is_admin() {
        "Make user"
    } else {
        "Make admin"
    };

    html! {
        div class="flex gap-4"
        {
            button
                hx-post=(toggle_url)
                hx-target-error="#alert-container"
                class=(LINK_STYLE)
            {
                (toggle_label)
            }

            @if user.id == current_user {
                span class={ (BUTTON_DELETE_STYLE) " opacity-50 cursor-not-allowed" } { "Delete" }
            } @else {
                (delete_action_button(
                    &delete_url,
                    &format!("Are you sure you want to delete {}? Everything they own will be deleted too.", user.username),
                    "closest tr",
                    "delete"
                ))
            }
        }
    }
}

fn users_view(users: &[User], principal: Principal) -> Markup {
    let nav_bar = NavBar::new(endpoints::ADMIN_DASHBOARD_VIEW, principal.role).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Users" }
                (users_table(users, Some(principal.user_id)))
            }
        }
    };

    base("Users", &[], &content)
}

/// Display every user with actions for changing their role or deleting them.
pub async fn get_admin_users_page(
    State(state): State<AdminState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let users = get_all_users(&connection)?;

    Ok(users_view(&users, principal).into_response())
}

fn toggle_role(user_id: UserID, connection: &Connection) -> Result<Role, Error> {
    let user = match get_user_by_id(user_id, connection) {
        Err(Error::NotFound) => return Err(Error::UpdateMissingUser),
        result => result?,
    };
    let role = user.role.toggled();

    set_user_role(user_id, role, connection)?;

    Ok(role)
}

/// A route handler that switches a user between the user and admin roles,
/// redirects to the users page on success.
pub async fn toggle_user_role_endpoint(
    State(state): State<AdminState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<i64>,
) -> Response {
    let user_id = UserID::new(user_id);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match toggle_role(user_id, &connection) {
        Ok(role) => {
            tracing::info!("Admin {} set the role of user {user_id} to {role}", principal.user_id);

            (
                HxRedirect(endpoints::ADMIN_USERS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::debug!("Could not change the role of user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler that deletes a user and everything they own, responds with an alert.
///
/// Admins cannot delete their own account.
pub async fn delete_user_endpoint(
    State(state): State<AdminState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<i64>,
) -> Response {
    let user_id = UserID::new(user_id);

    if user_id == principal.user_id {
        return Error::CannotDeleteSelf.into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_user(user_id, &connection) {
        Ok(()) => {
            tracing::info!("Admin {} deleted user {user_id}", principal.user_id);

            Alert::SuccessSimple {
                message: "User deleted successfully".to_owned(),
            }
            .into_response()
        }
        Err(error) => {
            tracing::debug!("Could not delete user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod admin_users_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::datetime;

    use crate::{
        Error,
        admin::AdminState,
        auth::{Principal, Role, get_user_by_id},
        endpoints,
        test_utils::{
            assert_hx_redirect, assert_status_ok, assert_valid_html, get_test_connection,
            insert_test_admin, insert_test_user, parse_html_document, select_text,
        },
        transaction::{Transaction, count_transactions, create_transaction},
        transaction_type::TransactionType,
    };

    use super::{delete_user_endpoint, get_admin_users_page, toggle_user_role_endpoint};

    fn admin_principal(admin_id: crate::auth::UserID) -> Principal {
        Principal {
            user_id: admin_id,
            role: Role::Admin,
        }
    }

    #[tokio::test]
    async fn lists_users() {
        let connection = get_test_connection();
        let admin = insert_test_admin("admin", &connection);
        insert_test_user("sita", &connection);
        let state = AdminState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_admin_users_page(State(state), Extension(admin_principal(admin.id)))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(select_text(&document, "#users tbody th"), vec!["admin", "sita"]);
    }

    #[tokio::test]
    async fn toggle_role_flips_between_user_and_admin() {
        let connection = get_test_connection();
        let admin = insert_test_admin("admin", &connection);
        let user = insert_test_user("sita", &connection);
        let state = AdminState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = toggle_user_role_endpoint(
            State(state.clone()),
            Extension(admin_principal(admin.id)),
            Path(user.id.as_i64()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ADMIN_USERS_VIEW);
        assert_eq!(
            get_user_by_id(user.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .role,
            Role::Admin
        );

        toggle_user_role_endpoint(
            State(state.clone()),
            Extension(admin_principal(admin.id)),
            Path(user.id.as_i64()),
        )
        .await;

        assert_eq!(
            get_user_by_id(user.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .role,
            Role::User
        );
    }

    #[tokio::test]
    async fn toggle_missing_user_is_not_found() {
        let connection = get_test_connection();
        let admin = insert_test_admin("admin", &connection);
        let state = AdminState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = toggle_user_role_endpoint(
            State(state),
            Extension(admin_principal(admin.id)),
            Path(999),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_cannot_delete_self() {
        let connection = get_test_connection();
        let admin = insert_test_admin("admin", &connection);
        let state = AdminState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_user_endpoint(
            State(state.clone()),
            Extension(admin_principal(admin.id)),
            Path(admin.id.as_i64()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(get_user_by_id(admin.id, &state.db_connection.lock().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn deleting_user_removes_their_transactions() {
        let connection = get_test_connection();
        let admin = insert_test_admin("admin", &connection);
        let user = insert_test_user("sita", &connection);
        create_transaction(
            Transaction::build(10.0, TransactionType::Expense, datetime!(2024-01-01 10:00)),
            user.id,
            &connection,
        )
        .unwrap();
        let state = AdminState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_user_endpoint(
            State(state.clone()),
            Extension(admin_principal(admin.id)),
            Path(user.id.as_i64()),
        )
        .await;

        assert_status_ok(&response);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_user_by_id(user.id, &connection), Err(Error::NotFound));
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[tokio::test]
    async fn deleting_missing_user_is_not_found() {
        let connection = get_test_connection();
        let admin = insert_test_admin("admin", &connection);
        let state = AdminState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            delete_user_endpoint(State(state), Extension(admin_principal(admin.id)), Path(999))
                .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
