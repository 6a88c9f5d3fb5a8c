use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    admin::{AdminState, users_page::users_table},
    auth::{Principal, User, count_admins, count_users, get_all_users},
    contact::count_contact_messages,
    endpoints,
    html::{CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
};

struct AdminOverview {
    total_users: usize,
    total_admins: usize,
    total_messages: usize,
    users: Vec<User>,
}

fn stat_card(id: &str, label: &str, value: usize, link: Option<(&str, &str)>) -> Markup {
    html! {
        div id=(id) class=(CARD_STYLE)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class="text-2xl font-bold text-gray-900 dark:text-white" { (value) }

            @if let Some((url, text)) = link {
                a href=(url) class={ (LINK_STYLE) " text-sm" } { (text) }
            }
        }
    }
}

fn admin_dashboard_view(overview: &AdminOverview, principal: Principal) -> Markup {
    let nav_bar = NavBar::new(endpoints::ADMIN_DASHBOARD_VIEW, principal.role).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Admin Dashboard" }

                div class="flex flex-wrap gap-4"
                {
                    (stat_card(
                        "total-users",
                        "Total Users",
                        overview.total_users,
                        Some((endpoints::ADMIN_USERS_VIEW, "Manage users"))
                    ))
                    (stat_card("total-admins", "Admins", overview.total_admins, None))
                    (stat_card(
                        "total-messages",
                        "Messages",
                        overview.total_messages,
                        Some((endpoints::ADMIN_MESSAGES_VIEW, "Read messages"))
                    ))
                }

                h2 class="text-lg font-semibold" { "Users" }
                (users_table(&overview.users, None))
            }
        }
    };

    base("Admin", &[], &content)
}

/// Display counts of users, admins and contact messages alongside the user list.
pub async fn get_admin_dashboard_page(
    State(state): State<AdminState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let overview = AdminOverview {
        total_users: count_users(&connection)?,
        total_admins: count_admins(&connection)?,
        total_messages: count_contact_messages(&connection)?,
        users: get_all_users(&connection)?,
    };

    Ok(admin_dashboard_view(&overview, principal).into_response())
}

#[cfg(test)]
mod admin_dashboard_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use time::macros::datetime;

    use crate::{
        admin::AdminState,
        auth::{Principal, Role},
        contact::create_contact_message,
        test_utils::{
            assert_status_ok, assert_valid_html, get_test_connection, insert_test_admin,
            insert_test_user, parse_html_document, select_text,
        },
    };

    use super::get_admin_dashboard_page;

    #[tokio::test]
    async fn shows_counts() {
        let connection = get_test_connection();
        let admin = insert_test_admin("admin", &connection);
        insert_test_user("sita", &connection);
        insert_test_user("ram", &connection);
        create_contact_message(
            "Hari",
            "hari@example.com",
            "Hello",
            datetime!(2024-01-01 09:00),
            &connection,
        )
        .unwrap();
        let state = AdminState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_admin_dashboard_page(
            State(state),
            Extension(Principal {
                user_id: admin.id,
                role: Role::Admin,
            }),
        )
        .await
        .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(select_text(&document, "#total-users p.text-2xl"), vec!["3"]);
        assert_eq!(select_text(&document, "#total-admins p.text-2xl"), vec!["1"]);
        assert_eq!(select_text(&document, "#total-messages p.text-2xl"), vec!["1"]);
        assert_eq!(
            select_text(&document, "#users tbody th"),
            vec!["admin", "sita", "ram"]
        );
    }
}
