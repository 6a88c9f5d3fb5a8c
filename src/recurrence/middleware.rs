//! Runs the recurrence engine before each authenticated request.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{UserID, get_token_from_cookies},
    recurrence::materialize_due_transactions,
    timezone::local_now,
};

/// The state needed to materialize recurring transactions.
#[derive(Debug, Clone)]
pub struct RecurrenceState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone name used to decide which day it is.
    pub local_timezone: String,
}

impl FromRef<AppState> for RecurrenceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The state needed to materialize recurring transactions on public routes, where the
/// visitor may or may not have a session.
#[derive(Debug, Clone)]
pub struct SessionRecurrenceState {
    pub cookie_key: Key,
    pub recurrence: RecurrenceState,
}

impl FromRef<AppState> for SessionRecurrenceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            recurrence: RecurrenceState::from_ref(state),
        }
    }
}

impl FromRef<SessionRecurrenceState> for Key {
    fn from_ref(state: &SessionRecurrenceState) -> Self {
        state.cookie_key.clone()
    }
}

fn run_recurrence(user_id: UserID, state: &RecurrenceState) -> Result<(), Error> {
    let now = local_now(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    materialize_due_transactions(user_id, now, &connection)?;

    Ok(())
}

/// Create any due recurring transactions for the logged in user, then handle the request.
///
/// If the recurring transactions cannot be created the request is not handled and an
/// error page is returned instead.
///
/// Must be layered inside [auth_guard](crate::auth::auth_guard) so that the [UserID] is set.
pub async fn recurrence_middleware(
    State(state): State<RecurrenceState>,
    Extension(user_id): Extension<UserID>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(error) = run_recurrence(user_id, &state) {
        tracing::error!("Could not create recurring transactions for user {user_id}: {error}");
        return error.into_response();
    }

    next.run(request).await
}

/// Create any due recurring transactions if the visitor has a valid session, then handle
/// the request.
///
/// Visitors without a session are passed straight through. This is for public routes,
/// which do not sit behind [auth_guard](crate::auth::auth_guard).
pub async fn session_recurrence_middleware(
    State(state): State<SessionRecurrenceState>,
    jar: PrivateCookieJar,
    request: Request,
    next: Next,
) -> Response {
    let Ok(token) = get_token_from_cookies(&jar) else {
        return next.run(request).await;
    };

    let user_id = token.user_id;

    if let Err(error) = run_recurrence(user_id, &state.recurrence) {
        tracing::error!("Could not create recurring transactions for user {user_id}: {error}");
        return error.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod recurrence_middleware_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;
    use time::Duration;

    use crate::{
        auth::UserID,
        recurrence::{Frequency, RecurrenceState, recurrence_middleware},
        test_utils::{get_test_connection, insert_test_user},
        timezone::{DEFAULT_TIMEZONE, local_now},
        transaction::{Transaction, count_transactions, create_transaction},
        transaction_type::TransactionType,
    };

    fn get_test_server(state: RecurrenceState, user_id: UserID) -> TestServer {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                recurrence_middleware,
            ))
            .layer(Extension(user_id))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn due_transactions_are_created_before_the_handler_runs() {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);
        let yesterday = local_now(DEFAULT_TIMEZONE).unwrap() - Duration::days(1);
        create_transaction(
            Transaction::build(20.0, TransactionType::Expense, yesterday)
                .recurring(Some(Frequency::Daily)),
            user.id,
            &connection,
        )
        .unwrap();
        let state = RecurrenceState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: DEFAULT_TIMEZONE.to_owned(),
        };
        let server = get_test_server(state.clone(), user.id);

        server.get("/").await.assert_status_ok();
        server.get("/").await.assert_status_ok();

        assert_eq!(
            count_transactions(&state.db_connection.lock().unwrap()),
            Ok(2)
        );
    }

    #[tokio::test]
    async fn invalid_timezone_is_an_error_page() {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);
        let state = RecurrenceState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Nowhere/Atlantis".to_owned(),
        };
        let server = get_test_server(state, user.id);

        let response = server.get("/").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
}

#[cfg(test)]
mod session_recurrence_middleware_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        extract::Path,
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use axum_test::TestServer;
    use sha2::Digest;
    use time::Duration;

    use crate::{
        Error,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, UserID, set_auth_cookie},
        endpoints::format_endpoint,
        recurrence::{
            Frequency, RecurrenceState, SessionRecurrenceState, session_recurrence_middleware,
        },
        test_utils::{get_test_connection, insert_test_user},
        timezone::{DEFAULT_TIMEZONE, local_now},
        transaction::{Transaction, count_transactions, create_transaction},
        transaction_type::TransactionType,
    };

    const LOG_IN_ROUTE: &str = "/log_in/{user_id}";

    async fn stub_log_in_route(
        Path(user_id): Path<i64>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        set_auth_cookie(jar, UserID::new(user_id), DEFAULT_COOKIE_DURATION)
    }

    fn get_state_with_due_transaction() -> (SessionRecurrenceState, UserID) {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);
        let yesterday = local_now(DEFAULT_TIMEZONE).unwrap() - Duration::days(1);
        create_transaction(
            Transaction::build(20.0, TransactionType::Expense, yesterday)
                .recurring(Some(Frequency::Daily)),
            user.id,
            &connection,
        )
        .unwrap();

        let state = SessionRecurrenceState {
            cookie_key: Key::from(&sha2::Sha512::digest("public pages")),
            recurrence: RecurrenceState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: DEFAULT_TIMEZONE.to_owned(),
            },
        };

        (state, user.id)
    }

    fn get_test_server(state: SessionRecurrenceState) -> TestServer {
        let app = Router::new()
            .route("/contact", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                session_recurrence_middleware,
            ))
            .route(LOG_IN_ROUTE, post(stub_log_in_route))
            .with_state(state);

        TestServer::new(app)
    }

    fn transaction_count(state: &SessionRecurrenceState) -> i64 {
        count_transactions(&state.recurrence.db_connection.lock().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn logged_in_visitor_gets_due_transactions() {
        let (state, user_id) = get_state_with_due_transaction();
        let server = get_test_server(state.clone());
        let token_cookie = server
            .post(&format_endpoint(LOG_IN_ROUTE, user_id.as_i64()))
            .await
            .cookie(COOKIE_TOKEN);

        server
            .get("/contact")
            .add_cookie(token_cookie)
            .await
            .assert_status_ok();

        assert_eq!(transaction_count(&state), 2);
    }

    #[tokio::test]
    async fn anonymous_visitor_is_passed_through() {
        let (state, _) = get_state_with_due_transaction();
        let server = get_test_server(state.clone());

        server.get("/contact").await.assert_status_ok();

        assert_eq!(transaction_count(&state), 1);
    }
}
