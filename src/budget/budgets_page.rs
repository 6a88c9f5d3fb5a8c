//! Shows each budget with how much of it has been spent.

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
    aggregation::BudgetProgress,
    auth::{Principal, UserID},
    budget::{BudgetWithCategory, get_budgets_for_user},
    category::{Category, get_categories_for_user},
    endpoints::{self, format_endpoint},
    html::{
        CARD_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links, format_currency, labelled_input, submit_button,
    },
    navigation::NavBar,
    transaction::get_category_spend,
    transaction_type::TransactionType,
};

/// The periods offered in the budget forms.
pub(crate) const BUDGET_PERIODS: [(&str, &str); 3] =
    [("monthly", "Monthly"), ("weekly", "Weekly"), ("yearly", "Yearly")];

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A budget with the progress of spending against it.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    pub budget: BudgetWithCategory,
    pub progress: BudgetProgress,
}

/// Every budget owned by a user with its progress, and the totals over all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetOverview {
    pub summaries: Vec<BudgetSummary>,
    /// The sum of the budget amounts.
    pub total_budget: f64,
    /// The sum of the spend against each budget.
    pub total_spent: f64,
}

/// Work out how much has been spent against each of the budgets owned by `user_id`.
pub fn get_budget_overview(user_id: UserID, connection: &Connection) -> Result<BudgetOverview, Error> {
    let summaries = get_budgets_for_user(user_id, connection)?
        .into_iter()
        .map(|budget| {
            let spend = get_category_spend(user_id, budget.budget.category_id, connection)?;
            let progress = BudgetProgress::new(budget.budget.amount, spend);

            Ok(BudgetSummary { budget, progress })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let total_budget = summaries.iter().map(|summary| summary.budget.budget.amount).sum();
    let total_spent = summaries.iter().map(|summary| summary.progress.spend).sum();

    Ok(BudgetOverview {
        summaries,
        total_budget,
        total_spent,
    })
}

/// Display the user's budgets and a form for creating a new one.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let overview = get_budget_overview(principal.user_id, &connection)?;
    let categories = get_categories_for_user(principal.user_id, &connection)?;

    Ok(budgets_view(&overview, &categories, principal).into_response())
}

fn progress_bar(progress: BudgetProgress) -> Markup {
    let bar_colour = if progress.exceeded {
        "bg-red-600"
    } else {
        "bg-blue-600"
    };

    html! {
        div class="w-full bg-gray-200 rounded-full h-2.5 dark:bg-gray-700"
        {
            div
                class={ "h-2.5 rounded-full " (bar_colour) }
                style={ "width: " (progress.bar_width()) "%" }
            {}
        }

        span class="text-xs" { (progress.percent) "%" }

        @if progress.exceeded {
            span class="ml-2 text-xs font-semibold text-red-600" { "Over budget" }
        }
    }
}

fn budget_row(summary: &BudgetSummary) -> Markup {
    let budget = &summary.budget.budget;
    let row_id = format!("budget-{}", budget.id);
    let edit_url = format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget.id);
    let delete_url = format_endpoint(endpoints::DELETE_BUDGET, budget.id);
    let confirm_message = format!("Are you sure you want to delete the budget '{}'?", budget.name);

    html! {
        tr id=(row_id) class=(TABLE_ROW_STYLE)
        {
            th
                scope="row"
                class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
            {
                (budget.name)
            }
            td class=(TABLE_CELL_STYLE) { (summary.budget.category_name) }
            td class=(TABLE_CELL_STYLE) { (budget.period) }
            td class="px-6 py-4 text-right" { (format_currency(budget.amount)) }
            td class="px-6 py-4 text-right" { (format_currency(summary.progress.spend)) }
            td class="px-6 py-4 min-w-40" { (progress_bar(summary.progress)) }
            td class=(TABLE_CELL_STYLE)
            {
                (edit_delete_action_links(
                    &edit_url,
                    &delete_url,
                    &confirm_message,
                    "closest tr",
                    "delete"
                ))
            }
        }
    }
}

fn new_budget_form(categories: &[Category]) -> Markup {
    html! {
        form
            id="new-budget-form"
            hx-post=(endpoints::POST_BUDGET)
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6 w-full"
        {
            (labelled_input("Name", "name", "text", "", true))
            (labelled_input("Amount", "amount", "number", "", true))

            div
            {
                label for="period" class=(FORM_LABEL_STYLE) { "Period" }

                select name="period" id="period" class=(FORM_TEXT_INPUT_STYLE) required
                {
                    @for (value, label) in BUDGET_PERIODS {
                        option value=(value) { (label) }
                    }
                }
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category_id" id="category_id" class=(FORM_TEXT_INPUT_STYLE) required
                {
                    @for category in categories.iter().filter(|category| category.transaction_type == TransactionType::Expense) {
                        option value=(category.id) { (category.name) }
                    }
                }
            }

            (labelled_input("Start Date", "start_date", "date", "", false))
            (labelled_input("End Date", "end_date", "date", "", false))

            (submit_button("Add Budget"))
        }
    }
}

fn budgets_view(overview: &BudgetOverview, categories: &[Category], principal: Principal) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW, principal.role).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Budgets" }

                div class="flex flex-wrap gap-4"
                {
                    div class=(CARD_STYLE)
                    {
                        p class="text-sm text-gray-500 dark:text-gray-400" { "Total Budget" }
                        p id="total-budget" class="text-xl font-semibold"
                        {
                            (format_currency(overview.total_budget))
                        }
                    }

                    div class=(CARD_STYLE)
                    {
                        p class="text-sm text-gray-500 dark:text-gray-400" { "Total Spent" }
                        p id="total-spent" class="text-xl font-semibold"
                        {
                            (format_currency(overview.total_spent))
                        }
                    }
                }

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table id="budgets" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Period" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Spent" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Progress" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for summary in &overview.summaries {
                                (budget_row(summary))
                            }

                            @if overview.summaries.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="7" class="px-6 py-4 text-center" { "No budgets yet." }
                                }
                            }
                        }
                    }
                }
            }

            section class=(FORM_CONTAINER_STYLE)
            {
                h2 class="text-lg font-semibold" { "New Budget" }
                (new_budget_form(categories))
            }
        }
    };

    base("Budgets", &[], &content)
}
