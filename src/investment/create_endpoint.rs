//! Defines the endpoint for recording a new investment.
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

use crate::{
    AppState, Error,
    aggregation::parse_form_date,
    auth::UserID,
    endpoints,
    investment::{Investment, InvestmentDetails, InvestmentType, NewInvestment, create_investment},
    timezone::local_now,
};

/// The state needed to record an investment.
#[derive(Debug, Clone)]
pub struct CreateInvestmentState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateInvestmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for recording an investment.
///
/// Which of the optional fields are read depends on `investment_type`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InvestmentForm {
    pub investment_type: String,
    pub name: String,
    pub notes: Option<String>,
    // Fixed deposits
    pub amount: Option<String>,
    pub rate: Option<String>,
    pub maturity_date: Option<String>,
    // Mutual funds
    pub units: Option<String>,
    pub nav: Option<String>,
    pub current_value: Option<String>,
    // Shares
    pub quantity: Option<String>,
    pub price: Option<String>,
    pub total_value: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Read an optional number, treating a missing or blank field as zero.
fn number_or_zero(value: &Option<String>) -> Result<f64, Error> {
    match non_empty(value) {
        None => Ok(0.0),
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| Error::InvalidAmount(raw.to_owned())),
    }
}

impl TryFrom<InvestmentForm> for NewInvestment {
    type Error = Error;

    fn try_from(form: InvestmentForm) -> Result<Self, Self::Error> {
        let details = match form.investment_type.parse::<InvestmentType>()? {
            InvestmentType::FixedDeposit => {
                let amount = non_empty(&form.amount).ok_or(Error::MissingField("amount"))?;

                InvestmentDetails::FixedDeposit {
                    amount: amount
                        .parse::<f64>()
                        .map_err(|_| Error::InvalidAmount(amount.to_owned()))?,
                    interest_rate: number_or_zero(&form.rate)?,
                    maturity_date: non_empty(&form.maturity_date)
                        .map(parse_form_date)
                        .transpose()?,
                }
            }
            InvestmentType::MutualFund => InvestmentDetails::MutualFund {
                units: number_or_zero(&form.units)?,
                nav: number_or_zero(&form.nav)?,
                current_value: number_or_zero(&form.current_value)?,
            },
            InvestmentType::Share => InvestmentDetails::Share {
                quantity: number_or_zero(&form.quantity)?,
                price: number_or_zero(&form.price)?,
                total_value: number_or_zero(&form.total_value)?,
            },
        };

        Ok(NewInvestment {
            name: form.name,
            notes: form.notes,
            details,
        })
    }
}

fn create_investment_from_form(
    form: InvestmentForm,
    user_id: UserID,
    state: &CreateInvestmentState,
) -> Result<Investment, Error> {
    let new_investment = NewInvestment::try_from(form)?;
    let now = local_now(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_investment(new_investment, user_id, now, &connection)
}

/// A route handler for recording an investment, redirects to the investments view on success.
pub async fn create_investment_endpoint(
    State(state): State<CreateInvestmentState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<InvestmentForm>,
) -> Response {
    match create_investment_from_form(form, user_id, &state) {
        Ok(investment) => {
            tracing::info!(
                "User {user_id} added {} {}",
                investment.investment_type,
                investment.id
            );

            (
                HxRedirect(endpoints::INVESTMENTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::debug!("Could not add investment for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod create_investment_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};
    use time::macros::date;

    use crate::{
        Error,
        auth::UserID,
        endpoints,
        investment::{InvestmentDetails, NewInvestment, get_investments_for_user},
        test_utils::{assert_hx_redirect, get_test_connection, insert_test_user},
        timezone::DEFAULT_TIMEZONE,
    };

    use super::{CreateInvestmentState, InvestmentForm, create_investment_endpoint};

    fn get_state() -> (CreateInvestmentState, UserID) {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);
        let state = CreateInvestmentState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: DEFAULT_TIMEZONE.to_owned(),
        };

        (state, user.id)
    }

    #[test]
    fn mutual_fund_fields_map_to_details() {
        let form = InvestmentForm {
            investment_type: "mutual_fund".to_owned(),
            name: "NIBL Growth".to_owned(),
            units: Some("100".to_owned()),
            nav: Some("10.5".to_owned()),
            current_value: Some("1200".to_owned()),
            ..Default::default()
        };

        let new_investment = NewInvestment::try_from(form).unwrap();

        assert_eq!(
            new_investment.details,
            InvestmentDetails::MutualFund {
                units: 100.0,
                nav: 10.5,
                current_value: 1200.0
            }
        );
    }

    #[test]
    fn missing_share_fields_are_zero() {
        let form = InvestmentForm {
            investment_type: "share".to_owned(),
            name: "NABIL".to_owned(),
            quantity: Some(String::new()),
            ..Default::default()
        };

        let new_investment = NewInvestment::try_from(form).unwrap();

        assert_eq!(
            new_investment.details,
            InvestmentDetails::Share {
                quantity: 0.0,
                price: 0.0,
                total_value: 0.0
            }
        );
    }

    #[test]
    fn fixed_deposit_needs_amount() {
        let form = InvestmentForm {
            investment_type: "fixed_deposit".to_owned(),
            name: "FD".to_owned(),
            ..Default::default()
        };

        assert_eq!(
            NewInvestment::try_from(form),
            Err(Error::MissingField("amount"))
        );
    }

    #[tokio::test]
    async fn records_fixed_deposit_and_redirects() {
        let (state, user_id) = get_state();
        let form = InvestmentForm {
            investment_type: "fixed_deposit".to_owned(),
            name: "NIC Asia FD".to_owned(),
            amount: Some("50000".to_owned()),
            rate: Some("8.5".to_owned()),
            maturity_date: Some("2025-04-01".to_owned()),
            ..Default::default()
        };

        let response =
            create_investment_endpoint(State(state.clone()), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::INVESTMENTS_VIEW);
        let investments =
            get_investments_for_user(user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(investments.len(), 1);
        assert_eq!(investments[0].maturity_date, Some(date!(2025-04-01)));
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        let (state, user_id) = get_state();
        let form = InvestmentForm {
            investment_type: "gold".to_owned(),
            name: "Bars".to_owned(),
            ..Default::default()
        };

        let response = create_investment_endpoint(State(state), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
