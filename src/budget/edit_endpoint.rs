//! Defines the endpoints for updating and deleting a budget.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    budget::{BudgetId, BudgetUpdate, create_endpoint::parse_amount, delete_budget, update_budget},
    endpoints,
};

/// The state needed to update or delete a budget.
#[derive(Debug, Clone)]
pub struct EditBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EditBudgetForm {
    pub name: String,
    pub amount: String,
    pub period: String,
}

/// A route handler for updating a budget, redirects to the budgets view on success.
pub async fn update_budget_endpoint(
    State(state): State<EditBudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
    Form(form): Form<EditBudgetForm>,
) -> Response {
    let amount = match parse_amount(&form.amount) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let update = BudgetUpdate {
        name: form.name,
        amount,
        period: form.period,
    };

    match update_budget(budget_id, user_id, update, &connection) {
        Ok(_) => {
            tracing::info!("User {user_id} updated budget {budget_id}");

            (
                HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::debug!("Could not update budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler for deleting a budget, responds with an alert.
pub async fn delete_budget_endpoint(
    State(state): State<EditBudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget(budget_id, user_id, &connection) {
        Ok(()) => {
            tracing::info!("User {user_id} deleted budget {budget_id}");

            Alert::SuccessSimple {
                message: "Budget deleted successfully".to_owned(),
            }
            .into_response()
        }
        Err(error) => {
            tracing::debug!("Could not delete budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}
