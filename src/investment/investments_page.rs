//! Lists a user's fixed deposits, mutual funds and shares.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::Principal,
    endpoints,
    html::{
        CARD_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, labelled_input, submit_button,
    },
    investment::{Investment, InvestmentTotals, InvestmentType, get_investments_for_user},
    navigation::NavBar,
};

/// The state needed for the investments page.
#[derive(Debug, Clone)]
pub struct InvestmentsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for InvestmentsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the user's investments grouped by type, with a total for each type.
pub async fn get_investments_page(
    State(state): State<InvestmentsPageState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let investments = get_investments_for_user(principal.user_id, &connection)?;

    Ok(investments_view(&investments, principal).into_response())
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|value| format!("{value:.2}")).unwrap_or_default()
}

fn optional_currency(value: Option<f64>) -> String {
    value.map(format_currency).unwrap_or_default()
}

fn fixed_deposit_table(investments: &[&Investment]) -> Markup {
    html! {
        table id="fixed-deposits" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Rate (%)" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Matures" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                }
            }

            tbody
            {
                @for investment in investments {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        th scope="row" class=(TABLE_CELL_STYLE) { (investment.name) }
                        td class=(TABLE_CELL_STYLE) { (format_currency(investment.amount)) }
                        td class=(TABLE_CELL_STYLE) { (optional_number(investment.interest_rate)) }
                        td class=(TABLE_CELL_STYLE)
                        {
                            @if let Some(date) = investment.maturity_date { (date) }
                        }
                        td class=(TABLE_CELL_STYLE) { (investment.status) }
                    }
                }
            }
        }
    }
}

/// Mutual funds and shares share a layout, only the column names differ.
fn holdings_table(
    id: &str,
    investments: &[&Investment],
    units_label: &str,
    price_label: &str,
) -> Markup {
    html! {
        table id=(id) class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                    th scope="col" class=(TABLE_CELL_STYLE) { (units_label) }
                    th scope="col" class=(TABLE_CELL_STYLE) { (price_label) }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Current Value" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                }
            }

            tbody
            {
                @for investment in investments {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        th scope="row" class=(TABLE_CELL_STYLE) { (investment.name) }
                        td class=(TABLE_CELL_STYLE) { (optional_number(investment.units)) }
                        td class=(TABLE_CELL_STYLE) { (optional_currency(investment.purchase_price)) }
                        td class=(TABLE_CELL_STYLE) { (optional_currency(investment.current_value)) }
                        td class=(TABLE_CELL_STYLE) { (investment.status) }
                    }
                }
            }
        }
    }
}

fn total_card(id: &str, label: &str, total: f64) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p id=(id) class="text-xl font-semibold" { (format_currency(total)) }
        }
    }
}

fn new_investment_form() -> Markup {
    html! {
        form
            id="new-investment-form"
            hx-post=(endpoints::POST_INVESTMENT)
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6 w-full"
        {
            div
            {
                label for="investment_type" class=(FORM_LABEL_STYLE) { "Type" }

                select name="investment_type" id="investment_type" class=(FORM_TEXT_INPUT_STYLE) required
                {
                    @for investment_type in InvestmentType::ALL {
                        option value=(investment_type.as_str()) { (investment_type.label()) }
                    }
                }
            }

            (labelled_input("Name", "name", "text", "", true))
            (labelled_input("Notes", "notes", "text", "", false))

            fieldset class="space-y-4"
            {
                legend class="text-sm font-semibold" { "Fixed deposit" }
                (labelled_input("Amount", "amount", "number", "", false))
                (labelled_input("Interest Rate (%)", "rate", "number", "", false))
                (labelled_input("Maturity Date", "maturity_date", "date", "", false))
            }

            fieldset class="space-y-4"
            {
                legend class="text-sm font-semibold" { "Mutual fund" }
                (labelled_input("Units", "units", "number", "", false))
                (labelled_input("NAV", "nav", "number", "", false))
                (labelled_input("Current Value", "current_value", "number", "", false))
            }

            fieldset class="space-y-4"
            {
                legend class="text-sm font-semibold" { "Share" }
                (labelled_input("Quantity", "quantity", "number", "", false))
                (labelled_input("Price", "price", "number", "", false))
                (labelled_input("Total Value", "total_value", "number", "", false))
            }

            (submit_button("Add Investment"))
        }
    }
}

fn investments_view(investments: &[Investment], principal: Principal) -> Markup {
    let nav_bar = NavBar::new(endpoints::INVESTMENTS_VIEW, principal.role).into_html();
    let totals = InvestmentTotals::from_investments(investments);
    let of_type = |investment_type: InvestmentType| -> Vec<&Investment> {
        investments
            .iter()
            .filter(|investment| investment.investment_type == investment_type)
            .collect()
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Investments" }

                div class="flex flex-wrap gap-4"
                {
                    (total_card("total-fixed-deposits", "Fixed Deposits", totals.fixed_deposits))
                    (total_card("total-mutual-funds", "Mutual Funds", totals.mutual_funds))
                    (total_card("total-shares", "Shares", totals.shares))
                    (total_card("total-investments", "Total", totals.total()))
                }

                h2 class="text-lg font-semibold" { "Fixed Deposits" }
                div class="overflow-x-auto dark:bg-gray-800"
                {
                    (fixed_deposit_table(&of_type(InvestmentType::FixedDeposit)))
                }

                h2 class="text-lg font-semibold" { "Mutual Funds" }
                div class="overflow-x-auto dark:bg-gray-800"
                {
                    (holdings_table("mutual-funds", &of_type(InvestmentType::MutualFund), "Units", "NAV"))
                }

                h2 class="text-lg font-semibold" { "Shares" }
                div class="overflow-x-auto dark:bg-gray-800"
                {
                    (holdings_table("shares", &of_type(InvestmentType::Share), "Quantity", "Price"))
                }
            }

            section class=(FORM_CONTAINER_STYLE)
            {
                h2 class="text-lg font-semibold" { "New Investment" }
                (new_investment_form())
            }
        }
    };

    base("Investments", &[], &content)
}

#[cfg(test)]
mod investments_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use time::macros::datetime;

    use crate::{
        auth::{Principal, Role},
        endpoints,
        investment::{InvestmentDetails, NewInvestment, create_investment},
        test_utils::{
            assert_form_input, assert_form_select, assert_hx_endpoint, assert_status_ok,
            assert_valid_html, get_test_connection, insert_test_user, must_get_form,
            parse_html_document, select_text,
        },
    };

    use super::{InvestmentsPageState, get_investments_page};

    #[tokio::test]
    async fn groups_investments_by_type_with_totals() {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);
        let now = datetime!(2024-04-01 10:00);
        for (name, details) in [
            (
                "FD",
                InvestmentDetails::FixedDeposit {
                    amount: 1_000.0,
                    interest_rate: 8.0,
                    maturity_date: None,
                },
            ),
            (
                "NABIL",
                InvestmentDetails::Share {
                    quantity: 2.0,
                    price: 100.0,
                    total_value: 250.0,
                },
            ),
        ] {
            create_investment(
                NewInvestment {
                    name: name.to_owned(),
                    notes: None,
                    details,
                },
                user.id,
                now,
                &connection,
            )
            .unwrap();
        }
        let state = InvestmentsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let principal = Principal {
            user_id: user.id,
            role: Role::User,
        };

        let response = get_investments_page(State(state), Extension(principal))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(select_text(&document, "#fixed-deposits tbody th"), vec!["FD"]);
        assert_eq!(select_text(&document, "#shares tbody th"), vec!["NABIL"]);
        assert!(select_text(&document, "#mutual-funds tbody th").is_empty());
        let total = select_text(&document, "#total-investments");
        assert!(total[0].ends_with("1,250.00") || total[0].ends_with("1250.00"), "got {total:?}");

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::POST_INVESTMENT, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_select(
            &form,
            "investment_type",
            &["fixed_deposit", "mutual_fund", "share"],
        );
    }
}
