//! Downloads a user's transactions as a CSV file.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    auth::UserID,
    transaction::{TransactionWithCategory, get_transactions_with_category},
};

const EXPORT_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

const EXPORT_HEADERS: [&str; 6] = ["ID", "Date", "Type", "Amount", "Category", "Note"];

/// The state needed to export transactions.
#[derive(Debug, Clone)]
pub struct ExportTransactionsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Write `rows` as CSV, one line per transaction after the header.
///
/// Transactions without a category are written with the category "N/A".
pub fn write_transactions_csv(rows: &[TransactionWithCategory]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for row in rows {
        let transaction = &row.transaction;
        let date = transaction
            .date
            .format(EXPORT_DATE_FORMAT)
            .map_err(|error| Error::CsvError(error.to_string()))?;

        writer
            .write_record([
                transaction.id.to_string(),
                date,
                transaction.transaction_type.label().to_owned(),
                transaction.amount.to_string(),
                row.category_name.clone().unwrap_or_else(|| "N/A".to_owned()),
                transaction.note.clone().unwrap_or_default(),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))
}

/// A route handler that sends all of the user's transactions, newest first, as a CSV attachment.
pub async fn export_transactions(
    State(state): State<ExportTransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let rows = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions_with_category(user_id, &connection)?
    };

    let body = write_transactions_csv(&rows)?;

    tracing::debug!("Exported {} transactions for user {user_id}", rows.len());

    Ok((
        [
            (CONTENT_TYPE, "text/csv"),
            (CONTENT_DISPOSITION, "attachment; filename=transactions.csv"),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod export_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use time::macros::datetime;

    use crate::{
        auth::UserID,
        category::get_categories_for_user,
        test_utils::{
            assert_content_type, assert_status_ok, get_header, get_test_connection,
            insert_test_user,
        },
        transaction::{
            Transaction, TransactionWithCategory, create_transaction,
            get_transactions_with_category,
        },
        transaction_type::TransactionType,
    };

    use super::{ExportTransactionsState, export_transactions, write_transactions_csv};

    #[test]
    fn writes_header_and_rows() {
        let rows = [
            TransactionWithCategory {
                transaction: Transaction {
                    id: 2,
                    user_id: UserID::new(1),
                    category_id: None,
                    amount: 12.5,
                    transaction_type: TransactionType::Expense,
                    note: Some("coffee, large".to_owned()),
                    date: datetime!(2024-03-05 08:07),
                    is_recurring: false,
                    frequency: None,
                    next_date: None,
                },
                category_name: None,
            },
            TransactionWithCategory {
                transaction: Transaction {
                    id: 1,
                    user_id: UserID::new(1),
                    category_id: Some(1),
                    amount: 1000.0,
                    transaction_type: TransactionType::Income,
                    note: None,
                    date: datetime!(2024-03-01 09:00),
                    is_recurring: false,
                    frequency: None,
                    next_date: None,
                },
                category_name: Some("Salary".to_owned()),
            },
        ];

        let csv = String::from_utf8(write_transactions_csv(&rows).unwrap()).unwrap();

        assert_eq!(
            csv,
            "ID,Date,Type,Amount,Category,Note\n\
            2,2024-03-05 08:07,Expense,12.5,N/A,\"coffee, large\"\n\
            1,2024-03-01 09:00,Income,1000,Salary,\n"
        );
    }

    #[test]
    fn amounts_are_written_as_stored() {
        let rows = [TransactionWithCategory {
            transaction: Transaction {
                id: 7,
                user_id: UserID::new(1),
                category_id: None,
                amount: 0.125,
                transaction_type: TransactionType::Expense,
                note: None,
                date: datetime!(2024-03-05 08:07),
                is_recurring: false,
                frequency: None,
                next_date: None,
            },
            category_name: None,
        }];

        let csv = String::from_utf8(write_transactions_csv(&rows).unwrap()).unwrap();

        assert_eq!(
            csv.lines().nth(1),
            Some("7,2024-03-05 08:07,Expense,0.125,N/A,")
        );
    }

    #[test]
    fn no_transactions_is_only_the_header() {
        let csv = String::from_utf8(write_transactions_csv(&[]).unwrap()).unwrap();

        assert_eq!(csv, "ID,Date,Type,Amount,Category,Note\n");
    }

    #[tokio::test]
    async fn export_is_a_csv_attachment_of_own_transactions() {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);
        let other_user = insert_test_user("ram", &connection);
        let food = get_categories_for_user(user.id, &connection)
            .unwrap()
            .into_iter()
            .find(|category| category.name == "Food")
            .unwrap();
        create_transaction(
            Transaction::build(20.0, TransactionType::Expense, datetime!(2024-03-05 08:07))
                .category_id(Some(food.id)),
            user.id,
            &connection,
        )
        .unwrap();
        create_transaction(
            Transaction::build(99.0, TransactionType::Income, datetime!(2024-03-05 08:07)),
            other_user.id,
            &connection,
        )
        .unwrap();
        assert_eq!(
            get_transactions_with_category(user.id, &connection)
                .unwrap()
                .len(),
            1
        );
        let state = ExportTransactionsState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = export_transactions(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_status_ok(&response);
        assert_content_type(&response, "text/csv");
        assert_eq!(
            get_header(&response, "content-disposition"),
            "attachment; filename=transactions.csv"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8_lossy(&body);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with(",2024-03-05 08:07,Expense,20,Food,"));
    }
}
