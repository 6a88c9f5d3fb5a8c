//! Defines the endpoint for creating a new budget.
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
use time::Date;

use crate::{
    AppState, Error,
    aggregation::parse_form_date,
    auth::UserID,
    budget::{Budget, NewBudget, create_budget},
    category::CategoryId,
    endpoints,
    timezone::local_now,
};

/// The state needed to create a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for creating a budget.
#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    pub name: String,
    pub amount: String,
    pub period: String,
    pub category_id: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

pub(crate) fn parse_amount(raw: &str) -> Result<f64, Error> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidAmount(raw.to_owned()))
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<Date>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_form_date(raw).map(Some),
    }
}

impl TryFrom<BudgetForm> for NewBudget {
    type Error = Error;

    fn try_from(form: BudgetForm) -> Result<Self, Self::Error> {
        let category_id = form.category_id.trim();
        if category_id.is_empty() {
            return Err(Error::MissingField("category_id"));
        }

        Ok(NewBudget {
            amount: parse_amount(&form.amount)?,
            category_id: category_id
                .parse::<CategoryId>()
                .map_err(|_| Error::InvalidCategory(None))?,
            start_date: parse_optional_date(form.start_date.as_deref())?,
            end_date: parse_optional_date(form.end_date.as_deref())?,
            name: form.name,
            period: form.period,
        })
    }
}

fn create_budget_from_form(
    form: BudgetForm,
    user_id: UserID,
    state: &CreateBudgetState,
) -> Result<Budget, Error> {
    let new_budget = NewBudget::try_from(form)?;
    let now = local_now(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_budget(new_budget, user_id, now, &connection)
}

/// A route handler for creating a new budget, redirects to the budgets view on success.
pub async fn create_budget_endpoint(
    State(state): State<CreateBudgetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetForm>,
) -> Response {
    match create_budget_from_form(form, user_id, &state) {
        Ok(budget) => {
            tracing::info!("User {user_id} created budget {}", budget.id);

            (
                HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::debug!("Could not create budget for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}
