//! The transaction listing: filters, totals, the expense breakdown and the form for
//! adding a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    aggregation::{CategoryExpense, DateFilter, Totals, expenses_by_category},
    auth::Principal,
    category::{Category, get_categories_for_user, type_badge},
    endpoints,
    html::{
        CARD_STYLE, FORM_CHECKBOX_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency, labelled_input, submit_button,
    },
    navigation::NavBar,
    recurrence::Frequency,
    timezone::local_now,
    transaction::{TransactionWithCategory, get_transactions_with_category},
    transaction_type::TransactionType,
};

const DISPLAY_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters for filtering the transaction listing.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    pub filter_by: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

struct TransactionsView<'a> {
    principal: Principal,
    query: &'a TransactionsQuery,
    filter: DateFilter,
    filter_error: Option<String>,
    transactions: Vec<&'a TransactionWithCategory>,
    totals: Totals,
    breakdown: Vec<CategoryExpense>,
    categories: &'a [Category],
}

/// Display the user's transactions, optionally filtered by date.
///
/// An invalid custom date shows a message and lists every transaction.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let now = local_now(&state.local_timezone)?;

    let (filter, filter_error) = match DateFilter::parse(
        query.filter_by.as_deref(),
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    ) {
        Ok(filter) => (filter, None),
        Err(error) => {
            tracing::debug!("Ignoring date filter {query:?}: {error}");
            (DateFilter::All, Some("Invalid date format.".to_owned()))
        }
    };

    let (rows, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_transactions_with_category(principal.user_id, &connection)?,
            get_categories_for_user(principal.user_id, &connection)?,
        )
    };

    let transactions: Vec<&TransactionWithCategory> = match filter.range(now) {
        Some(range) => rows
            .iter()
            .filter(|row| range.contains(row.transaction.date))
            .collect(),
        None => rows.iter().collect(),
    };
    let totals = Totals::from_transactions(transactions.iter().map(|row| &row.transaction));
    let breakdown = expenses_by_category(&rows);

    let view = TransactionsView {
        principal,
        query: &query,
        filter,
        filter_error,
        transactions,
        totals,
        breakdown,
        categories: &categories,
    };

    Ok(transactions_view(view).into_response())
}

fn filter_form(query: &TransactionsQuery, filter: DateFilter, error: Option<&str>) -> Markup {
    let selected = match (filter, query.filter_by.as_deref()) {
        (DateFilter::All, Some("custom")) => "custom",
        (filter, _) => filter.as_str(),
    };
    let options = [
        ("all", "All"),
        ("today", "Today"),
        ("month", "This Month"),
        ("custom", "Custom Range"),
    ];
    let date_value = |date: Option<&String>| date.map(String::as_str).unwrap_or_default().to_owned();

    html! {
        form
            id="filter-form"
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="flex flex-wrap items-end gap-4"
        {
            div
            {
                label for="filter_by" class=(FORM_LABEL_STYLE) { "Show" }

                select name="filter_by" id="filter_by" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for (value, label) in options {
                        option value=(value) selected[value == selected] { (label) }
                    }
                }
            }

            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    name="start_date"
                    id="start_date"
                    value=(date_value(query.start_date.as_ref()))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    name="end_date"
                    id="end_date"
                    value=(date_value(query.end_date.as_ref()))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button
                type="submit"
                class="px-4 py-2.5 bg-blue-500 hover:bg-blue-600 text-white rounded"
            {
                "Filter"
            }
        }

        @if let Some(error) = error {
            p id="filter-error" class="text-red-500 text-base" { (error) }
        }
    }
}

fn totals_cards(totals: Totals) -> Markup {
    html! {
        div class="flex flex-wrap gap-4"
        {
            div class=(CARD_STYLE)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Income" }
                p id="total-income" class="text-xl font-semibold text-green-600"
                {
                    (format_currency(totals.income))
                }
            }

            div class=(CARD_STYLE)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Expenses" }
                p id="total-expense" class="text-xl font-semibold text-red-600"
                {
                    (format_currency(totals.expense))
                }
            }

            div class=(CARD_STYLE)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Balance" }
                p id="balance" class="text-xl font-semibold"
                {
                    (format_currency(totals.balance()))
                }
            }
        }
    }
}

fn breakdown_table(breakdown: &[CategoryExpense]) -> Markup {
    html! {
        section id="expense-breakdown" class="space-y-2"
        {
            h2 class="text-lg font-semibold" { "Expenses by Category" }

            @if breakdown.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "No expenses yet." }
            } @else {
                ul class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for expense in breakdown {
                        li class="flex justify-between py-2"
                        {
                            span { (expense.category_name) }
                            span { (format_currency(expense.total)) }
                        }
                    }
                }
            }
        }
    }
}

fn format_date(date: PrimitiveDateTime) -> String {
    date.format(DISPLAY_DATE_FORMAT)
        .unwrap_or_else(|_| date.date().to_string())
}

fn transactions_table(transactions: &[&TransactionWithCategory]) -> Markup {
    html! {
        div class="overflow-x-auto dark:bg-gray-800"
        {
            table id="transactions" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Note" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Repeats" }
                    }
                }

                tbody
                {
                    @for row in transactions {
                        @let transaction = &row.transaction;

                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (format_date(transaction.date)) }
                            td class=(TABLE_CELL_STYLE) { (type_badge(transaction.transaction_type)) }
                            td class="px-6 py-4 text-right" { (format_currency(transaction.amount)) }
                            td class=(TABLE_CELL_STYLE) { (row.category_name.as_deref().unwrap_or("N/A")) }
                            td class=(TABLE_CELL_STYLE) { (transaction.note.as_deref().unwrap_or_default()) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                @match (transaction.is_recurring, transaction.frequency) {
                                    (true, Some(frequency)) => { (frequency.label()) }
                                    _ => {}
                                }
                            }
                        }
                    }

                    @if transactions.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="6" class="px-6 py-4 text-center" { "No transactions found." }
                        }
                    }
                }
            }
        }
    }
}

fn new_transaction_form(categories: &[Category]) -> Markup {
    html! {
        form
            id="new-transaction-form"
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6 w-full"
        {
            (labelled_input("Amount", "amount", "number", "", true))

            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }

                select name="type" id="type" class=(FORM_TEXT_INPUT_STYLE) required
                {
                    option value=(TransactionType::Expense.as_str()) { (TransactionType::Expense.label()) }
                    option value=(TransactionType::Income.as_str()) { (TransactionType::Income.label()) }
                }
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category_id" id="category_id" class=(FORM_TEXT_INPUT_STYLE) required
                {
                    @for category in categories {
                        option value=(category.id)
                        {
                            (category.name) " (" (category.transaction_type.label()) ")"
                        }
                    }
                }
            }

            (labelled_input("Note", "note", "text", "", false))

            div class="flex items-center gap-2"
            {
                input
                    type="checkbox"
                    name="is_recurring"
                    id="is_recurring"
                    value="yes"
                    class=(FORM_CHECKBOX_STYLE);
                label for="is_recurring" class="text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Repeat this transaction"
                }
            }

            div
            {
                label for="frequency" class=(FORM_LABEL_STYLE) { "Frequency" }

                select name="frequency" id="frequency" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for frequency in Frequency::ALL {
                        option value=(frequency.as_str()) { (frequency.label()) }
                    }
                }
            }

            (submit_button("Add Transaction"))
        }
    }
}

fn transactions_view(view: TransactionsView) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW, view.principal.role).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                div class="flex justify-between items-center"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(endpoints::EXPORT_TRANSACTIONS) class=(LINK_STYLE) { "Export CSV" }
                }

                (filter_form(view.query, view.filter, view.filter_error.as_deref()))
                (totals_cards(view.totals))
                (transactions_table(&view.transactions))
                (breakdown_table(&view.breakdown))
            }

            section class=(FORM_CONTAINER_STYLE)
            {
                h2 class="text-lg font-semibold" { "New Transaction" }
                (new_transaction_form(view.categories))
            }
        }
    };

    base("Transactions", &[], &content)
}
