//! The page for changing the name, amount and period of a budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::Principal,
    budget::{Budget, BudgetId, budgets_page::BUDGET_PERIODS, get_owned_budget},
    endpoints::{self, format_endpoint},
    html::{
        FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
        labelled_input, link, submit_button,
    },
    navigation::NavBar,
};

/// The state needed for the edit budget page.
#[derive(Debug, Clone)]
pub struct EditBudgetPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the form for editing one of the user's budgets.
///
/// Responds with 404 if the budget does not exist and 403 if it belongs to another user.
pub async fn get_edit_budget_page(
    State(state): State<EditBudgetPageState>,
    Extension(principal): Extension<Principal>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = get_owned_budget(budget_id, principal.user_id, &connection)?;

    Ok(edit_budget_view(&budget, principal).into_response())
}

fn edit_budget_view(budget: &Budget, principal: Principal) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW, principal.role).into_html();
    let update_url = format_endpoint(endpoints::PUT_BUDGET, budget.id);
    let amount = format!("{:.2}", budget.amount);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class=(FORM_CONTAINER_STYLE)
            {
                h1 class="text-xl font-bold" { "Edit Budget" }

                form
                    hx-put=(update_url)
                    hx-target-error="#alert-container"
                    class="space-y-4 md:space-y-6 w-full"
                {
                    (labelled_input("Name", "name", "text", &budget.name, true))
                    (labelled_input("Amount", "amount", "number", &amount, true))

                    div
                    {
                        label for="period" class=(FORM_LABEL_STYLE) { "Period" }

                        select name="period" id="period" class=(FORM_TEXT_INPUT_STYLE) required
                        {
                            @for (value, label) in BUDGET_PERIODS {
                                option value=(value) selected[value == budget.period] { (label) }
                            }

                            @if !BUDGET_PERIODS.iter().any(|(value, _)| *value == budget.period) {
                                option value=(budget.period) selected { (budget.period) }
                            }
                        }
                    }

                    (submit_button("Save Budget"))
                }

                p { (link(endpoints::BUDGETS_VIEW, "Back to budgets")) }
            }
        }
    };

    base("Edit Budget", &[], &content)
}
