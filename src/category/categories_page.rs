//! Lists the categories a user can choose from and the form for adding their own.

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
    category::{Category, get_categories_for_user},
    endpoints,
    html::{
        BADGE_EXPENSE_STYLE, BADGE_INCOME_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, labelled_input, submit_button,
    },
    navigation::NavBar,
    transaction_type::TransactionType,
};

/// The state needed for the categories page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub(crate) fn type_badge(transaction_type: TransactionType) -> Markup {
    let style = match transaction_type {
        TransactionType::Income => BADGE_INCOME_STYLE,
        TransactionType::Expense => BADGE_EXPENSE_STYLE,
    };

    html!( span class=(style) { (transaction_type.label()) } )
}

fn new_category_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::CATEGORIES_API)
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            (labelled_input("Name", "name", "text", "", true))

            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }

                select name="type" id="type" class=(FORM_TEXT_INPUT_STYLE) required
                {
                    option value=(TransactionType::Expense.as_str()) { (TransactionType::Expense.label()) }
                    option value=(TransactionType::Income.as_str()) { (TransactionType::Income.label()) }
                }
            }

            (submit_button("Add Category"))
        }
    }
}

fn categories_view(categories: &[Category], principal: Principal) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW, principal.role).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Categories" }

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Owner" }
                            }
                        }

                        tbody
                        {
                            @for category in categories {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    th
                                        scope="row"
                                        class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                                    {
                                        (category.name)
                                    }
                                    td class=(TABLE_CELL_STYLE) { (type_badge(category.transaction_type)) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        @if category.is_global() { "Default" } @else { "Yours" }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            section class=(FORM_CONTAINER_STYLE)
            {
                h2 class="text-lg font-semibold" { "New Category" }
                (new_category_form())
            }
        }
    };

    base("Categories", &[], &content)
}

/// Display the categories visible to the user and a form for creating a new one.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories_for_user(principal.user_id, &connection)?;

    Ok(categories_view(&categories, principal).into_response())
}
