//! The public contact form.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    contact::{ContactMessage, create_contact_message},
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, labelled_input, link, log_in_register,
        submit_button,
    },
    timezone::local_now,
};

/// The state needed to store contact messages.
#[derive(Debug, Clone)]
pub struct ContactState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for ContactState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

fn contact_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_CONTACT)
            hx-swap="none"
            class="space-y-4 md:space-y-6"
        {
            (labelled_input("Name", "name", "text", "", true))
            (labelled_input("Email", "email", "email", "", true))

            div
            {
                label for="message" class=(FORM_LABEL_STYLE) { "Message" }

                textarea
                    name="message"
                    id="message"
                    rows="5"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {}
            }

            (submit_button("Send Message"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Back to " (link(endpoints::DASHBOARD_VIEW, "your dashboard"))
            }
        }
    }
}

/// Display the contact form. Does not need the user to be logged in.
pub async fn get_contact_page() -> Response {
    base("Contact", &[], &log_in_register("Contact Us", &contact_form())).into_response()
}

fn send_message(form: &ContactForm, state: &ContactState) -> Result<ContactMessage, Error> {
    let now = local_now(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_contact_message(&form.name, &form.email, &form.message, now, &connection)
}

/// A route handler for storing a message from the contact form, responds with an alert.
pub async fn post_contact(
    State(state): State<ContactState>,
    Form(form): Form<ContactForm>,
) -> Response {
    match send_message(&form, &state) {
        Ok(message) => {
            tracing::info!("Received contact message {}", message.id);

            Alert::Success {
                message: "Message sent".to_owned(),
                details: "Your message has been sent successfully!".to_owned(),
            }
            .into_response()
        }
        Err(error) => {
            tracing::debug!("Could not store contact message: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod contact_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};

    use crate::{
        contact::get_contact_messages,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_status_ok,
            assert_valid_html, get_test_connection, must_get_form, parse_html_document,
        },
        timezone::DEFAULT_TIMEZONE,
    };

    use super::{ContactForm, ContactState, get_contact_page, post_contact};

    fn get_state() -> ContactState {
        ContactState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
            local_timezone: DEFAULT_TIMEZONE.to_owned(),
        }
    }

    #[tokio::test]
    async fn contact_page_has_form() {
        let response = get_contact_page().await;

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::POST_CONTACT, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_input(&form, "email", "email");
        assert_form_submit_button(&form);
    }

    #[tokio::test]
    async fn message_is_stored() {
        let state = get_state();

        let response = post_contact(
            State(state.clone()),
            Form(ContactForm {
                name: "Sita".to_owned(),
                email: "sita@example.com".to_owned(),
                message: "How do I export?".to_owned(),
            }),
        )
        .await;

        assert_status_ok(&response);
        let messages = get_contact_messages(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, "How do I export?");
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let state = get_state();

        let response = post_contact(
            State(state.clone()),
            Form(ContactForm {
                name: "Sita".to_owned(),
                email: "sita".to_owned(),
                message: "Hello".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            get_contact_messages(&state.db_connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );
    }
}
