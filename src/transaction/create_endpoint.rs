//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::PrimitiveDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    category::CategoryId,
    endpoints,
    recurrence::Frequency,
    timezone::local_now,
    transaction::{Transaction, TransactionBuilder, create_transaction},
    transaction_type::TransactionType,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone name used to timestamp new transactions.
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for creating a transaction.
///
/// Numbers are read as strings so that bad input is reported as a validation
/// error rather than rejected by the extractor.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    pub amount: String,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub category_id: String,
    #[serde(default)]
    pub note: Option<String>,
    /// Set to "yes" when the recurring checkbox is ticked.
    #[serde(default)]
    pub is_recurring: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
}

impl TransactionForm {
    /// Validate the form fields and turn them into a builder dated `now`.
    pub fn into_builder(self, now: PrimitiveDateTime) -> Result<TransactionBuilder, Error> {
        let amount = self
            .amount
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidAmount(self.amount.clone()))?;
        let transaction_type = self.transaction_type.parse::<TransactionType>()?;

        let category_id = self.category_id.trim();
        if category_id.is_empty() {
            return Err(Error::MissingField("category_id"));
        }
        let category_id = category_id
            .parse::<CategoryId>()
            .map_err(|_| Error::InvalidCategory(None))?;

        let builder = Transaction::build(amount, transaction_type, now)
            .category_id(Some(category_id))
            .note(self.note.as_deref());

        if self.is_recurring.as_deref() == Some("yes") {
            let frequency = self.frequency.as_deref().and_then(Frequency::parse);
            Ok(builder.recurring(frequency))
        } else {
            Ok(builder)
        }
    }
}

fn create_transaction_from_form(
    form: TransactionForm,
    user_id: UserID,
    state: &CreateTransactionState,
) -> Result<Transaction, Error> {
    let now = local_now(&state.local_timezone)?;
    let builder = form.into_builder(now)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_transaction(builder, user_id, &connection)
}

/// A route handler for creating a new transaction, redirects to the transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    match create_transaction_from_form(form, user_id, &state) {
        Ok(transaction) => {
            tracing::info!("User {user_id} created transaction {}", transaction.id);

            (
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::debug!("Could not create transaction for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod create_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};
    use time::{Duration, macros::datetime};

    use crate::{
        Error,
        auth::UserID,
        category::{Category, get_categories_for_user},
        endpoints,
        recurrence::Frequency,
        test_utils::{assert_hx_redirect, get_test_connection, insert_test_user},
        timezone::DEFAULT_TIMEZONE,
        transaction::{count_transactions, get_transactions_with_category},
        transaction_type::TransactionType,
    };

    use super::{CreateTransactionState, TransactionForm, create_transaction_endpoint};

    fn form(amount: &str, transaction_type: &str, category_id: &str) -> TransactionForm {
        TransactionForm {
            amount: amount.to_owned(),
            transaction_type: transaction_type.to_owned(),
            category_id: category_id.to_owned(),
            note: None,
            is_recurring: None,
            frequency: None,
        }
    }

    fn find_category(name: &str, user_id: UserID, state: &CreateTransactionState) -> Category {
        get_categories_for_user(user_id, &state.db_connection.lock().unwrap())
            .unwrap()
            .into_iter()
            .find(|category| category.name == name)
            .unwrap()
    }

    fn get_state() -> (CreateTransactionState, UserID) {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);
        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: DEFAULT_TIMEZONE.to_owned(),
        };

        (state, user.id)
    }

    #[tokio::test]
    async fn creates_transaction_and_redirects() {
        let (state, user_id) = get_state();
        let food = find_category("Food", user_id, &state);
        let mut form = form("12.50", "expense", &food.id.to_string());
        form.note = Some(" lunch ".to_owned());

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let rows =
            get_transactions_with_category(user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction.amount, 12.5);
        assert_eq!(rows[0].transaction.note.as_deref(), Some("lunch"));
        assert_eq!(rows[0].category_name.as_deref(), Some("Food"));
        assert!(!rows[0].transaction.is_recurring);
        assert_eq!(rows[0].transaction.next_date, None);
    }

    #[tokio::test]
    async fn recurring_transaction_is_scheduled() {
        let (state, user_id) = get_state();
        let rent = find_category("Rent", user_id, &state);
        let mut form = form("800", "expense", &rent.id.to_string());
        form.is_recurring = Some("yes".to_owned());
        form.frequency = Some("weekly".to_owned());

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let rows =
            get_transactions_with_category(user_id, &state.db_connection.lock().unwrap()).unwrap();
        let transaction = &rows[0].transaction;
        assert!(transaction.is_recurring);
        assert_eq!(transaction.frequency, Some(Frequency::Weekly));
        assert_eq!(
            transaction.next_date,
            Some(transaction.date + Duration::days(7))
        );
    }

    #[tokio::test]
    async fn invalid_amounts_are_rejected() {
        let (state, user_id) = get_state();
        let food = find_category("Food", user_id, &state);

        for amount in ["abc", "0", "-5", ""] {
            let response = create_transaction_endpoint(
                State(state.clone()),
                Extension(user_id),
                Form(form(amount, "expense", &food.id.to_string())),
            )
            .await;

            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "amount {amount:?} should be rejected"
            );
        }

        assert_eq!(
            count_transactions(&state.db_connection.lock().unwrap()),
            Ok(0)
        );
    }

    #[tokio::test]
    async fn missing_category_is_rejected() {
        let (state, user_id) = get_state();

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(form("10", "expense", "")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mismatched_category_type_is_rejected() {
        let (state, user_id) = get_state();
        let salary = find_category("Salary", user_id, &state);

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(form("10", "expense", &salary.id.to_string())),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            count_transactions(&state.db_connection.lock().unwrap()),
            Ok(0)
        );
    }

    #[test]
    fn form_without_recurring_checkbox_ignores_frequency() {
        let mut form = form("10", "income", "1");
        form.frequency = Some("daily".to_owned());

        let builder = form.into_builder(datetime!(2024-05-01 9:00)).unwrap();

        assert!(!builder.is_recurring);
        assert_eq!(builder.frequency, None);
        assert_eq!(builder.transaction_type, TransactionType::Income);
    }

    #[test]
    fn non_numeric_category_is_invalid() {
        let result = form("10", "income", "abc").into_builder(datetime!(2024-05-01 9:00));

        assert_eq!(result, Err(Error::InvalidCategory(None)));
    }
}
