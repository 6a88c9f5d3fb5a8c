use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    admin::AdminState,
    alert::Alert,
    auth::Principal,
    contact::{ContactMessage, MessageId, delete_contact_message, get_contact_messages},
    endpoints::{self, format_endpoint},
    html::{CARD_STYLE, PAGE_CONTAINER_STYLE, base, delete_action_button},
    navigation::NavBar,
};

const DATE_SENT_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

fn message_card(message: &ContactMessage) -> Markup {
    let delete_url = format_endpoint(endpoints::DELETE_MESSAGE, message.id);
    let date_sent = message
        .date_sent
        .format(DATE_SENT_FORMAT)
        .unwrap_or_else(|_| message.date_sent.to_string());

    html! {
        article id={ "message-" (message.id) } class={ (CARD_STYLE) " space-y-2" }
        {
            div class="flex justify-between items-start gap-4"
            {
                div
                {
                    h2 class="font-semibold text-gray-900 dark:text-white" { (message.name) }
                    p class="text-sm text-gray-500 dark:text-gray-400" { (message.email) }
                }

                time class="text-sm text-gray-500 dark:text-gray-400" { (date_sent) }
            }

            p class="whitespace-pre-line" { (message.message) }

            (delete_action_button(
                &delete_url,
                "Are you sure you want to delete this message?",
                "closest article",
                "delete"
            ))
        }
    }
}

fn messages_view(messages: &[ContactMessage], principal: Principal) -> Markup {
    let nav_bar = NavBar::new(endpoints::ADMIN_DASHBOARD_VIEW, principal.role).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section id="messages" class="space-y-4 w-full lg:max-w-3xl"
            {
                h1 class="text-xl font-bold" { "Contact Messages" }

                @if messages.is_empty() {
                    p id="no-messages" { "No messages yet." }
                }

                @for message in messages {
                    (message_card(message))
                }
            }
        }
    };

    base("Messages", &[], &content)
}

/// Display the messages sent through the contact form, newest first.
pub async fn get_admin_messages_page(
    State(state): State<AdminState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let messages = get_contact_messages(&connection)?;

    Ok(messages_view(&messages, principal).into_response())
}

/// A route handler for deleting a contact message, responds with an alert.
pub async fn delete_message_endpoint(
    State(state): State<AdminState>,
    Path(message_id): Path<MessageId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_contact_message(message_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Message deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::debug!("Could not delete message {message_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod admin_messages_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::datetime;

    use crate::{
        admin::AdminState,
        auth::{Principal, Role},
        contact::{count_contact_messages, create_contact_message},
        test_utils::{
            assert_status_ok, assert_valid_html, get_test_connection, insert_test_admin,
            parse_html_document, select_text,
        },
    };

    use super::{delete_message_endpoint, get_admin_messages_page};

    #[tokio::test]
    async fn lists_messages_newest_first() {
        let connection = get_test_connection();
        let admin = insert_test_admin("admin", &connection);
        for (name, date_sent) in [
            ("Older", datetime!(2024-01-01 09:00)),
            ("Newer", datetime!(2024-03-01 09:00)),
        ] {
            create_contact_message(name, "someone@example.com", "Hi", date_sent, &connection)
                .unwrap();
        }
        let state = AdminState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_admin_messages_page(
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
        assert_eq!(select_text(&document, "#messages h2"), vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn shows_placeholder_without_messages() {
        let connection = get_test_connection();
        let admin = insert_test_admin("admin", &connection);
        let state = AdminState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_admin_messages_page(
            State(state),
            Extension(Principal {
                user_id: admin.id,
                role: Role::Admin,
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(select_text(&document, "#no-messages"), vec!["No messages yet."]);
    }

    #[tokio::test]
    async fn delete_message() {
        let connection = get_test_connection();
        let message = create_contact_message(
            "Sita",
            "sita@example.com",
            "Hello",
            datetime!(2024-01-01 09:00),
            &connection,
        )
        .unwrap();
        let state = AdminState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_message_endpoint(State(state.clone()), Path(message.id)).await;
        assert_status_ok(&response);
        assert_eq!(
            count_contact_messages(&state.db_connection.lock().unwrap()),
            Ok(0)
        );

        let response = delete_message_endpoint(State(state), Path(message.id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
