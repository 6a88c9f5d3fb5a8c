//! The dashboard: overall totals and charts over all of the user's transactions.

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
    aggregation::{MonthlySeries, Totals, expenses_by_category},
    auth::Principal,
    dashboard::charts::{
        DashboardChart, balance_chart, charts_script, charts_view, expenses_by_category_chart,
        income_expense_chart,
    },
    endpoints,
    html::{CARD_STYLE, HeadElement, PAGE_CONTAINER_STYLE, base, format_currency, link},
    navigation::NavBar,
    transaction::{TransactionWithCategory, get_transactions_with_category},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display a page with an overview of the user's income and expenses.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, Error> {
    let rows = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions_with_category(principal.user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?
    };

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW, principal.role).into_html();

    if rows.is_empty() {
        return Ok(dashboard_no_data_view(nav_bar).into_response());
    }

    let totals = Totals::from_transactions(rows.iter().map(|row| &row.transaction));
    let charts = build_dashboard_charts(&rows);

    Ok(dashboard_view(nav_bar, totals, &charts).into_response())
}

fn build_dashboard_charts(rows: &[TransactionWithCategory]) -> [DashboardChart; 3] {
    let series = MonthlySeries::from_transactions(rows.iter().map(|row| &row.transaction));
    let expenses = expenses_by_category(rows);

    [
        DashboardChart {
            id: "income-expense-chart",
            options: income_expense_chart(&series).to_string(),
        },
        DashboardChart {
            id: "balance-chart",
            options: balance_chart(&series).to_string(),
        },
        DashboardChart {
            id: "expenses-chart",
            options: expenses_by_category_chart(&expenses).to_string(),
        },
    ]
}

fn total_card(id: &str, label: &str, amount: f64, text_style: &str) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p id=(id) class={ "text-2xl font-semibold " (text_style) } { (format_currency(amount)) }
        }
    }
}

fn dashboard_view(nav_bar: Markup, totals: Totals, charts: &[DashboardChart]) -> Markup {
    let balance_style = if totals.balance() < 0.0 {
        "text-red-600"
    } else {
        "text-gray-900 dark:text-white"
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section id="totals" class="flex flex-wrap gap-4 w-full mb-4"
            {
                (total_card("total-income", "Total Income", totals.income, "text-green-600"))
                (total_card("total-expense", "Total Expenses", totals.expense, "text-red-600"))
                (total_card("balance", "Balance", totals.balance(), balance_style))
            }

            (charts_view(charts))
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(charts),
    ];

    base("Dashboard", &scripts, &content)
}

fn dashboard_no_data_view(nav_bar: Markup) -> Markup {
    let new_transaction_link = link(endpoints::TRANSACTIONS_VIEW, "the transactions page");

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Charts will show up here once you add some transactions.
                You can add transactions on " (new_transaction_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}
