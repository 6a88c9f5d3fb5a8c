//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert, category::CategoryId, forbidden::ForbiddenError,
    internal_server_error::InternalServerError, not_found::NotFoundError,
};

/// The broad classes of failure an [Error] belongs to.
///
/// The class decides how an error is surfaced to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The client sent malformed or incomplete data. Nothing was changed.
    Validation,
    /// The requested resource does not exist.
    NotFound,
    /// The client is not allowed to act on the resource. Nothing was changed.
    Authorization,
    /// The store or the server failed. The unit of work was rolled back.
    Persistence,
}

impl ErrorKind {
    /// The HTTP status code used to report this class of error.
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string is not a usable email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email address is already used by another account.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An empty string was used as a username.
    #[error("Username cannot be empty")]
    EmptyUsername,

    /// The string does not name a role.
    #[error("\"{0}\" is not a valid role")]
    InvalidRole(String),

    /// An admin tried to delete their own account.
    #[error("you cannot delete your own account")]
    CannotDeleteSelf,

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A category with the same name and type is already visible to the user.
    #[error("the category already exists")]
    DuplicateCategory,

    /// The category ID did not match a category visible to the user.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// The transaction type differs from the type of its category.
    #[error("the transaction type does not match the category type")]
    CategoryTypeMismatch,

    /// The string is not "income" or "expense".
    #[error("\"{0}\" is not a valid transaction type")]
    InvalidTransactionType(String),

    /// An amount was negative, zero where not allowed, or not a finite number.
    #[error("invalid amount {0}")]
    InvalidAmount(String),

    /// A date string could not be parsed as `YYYY-MM-DD`.
    #[error("invalid date format: \"{0}\"")]
    InvalidDateFormat(String),

    /// An empty string was used as a budget name.
    #[error("Budget name cannot be empty")]
    EmptyBudgetName,

    /// The string does not name an investment type.
    #[error("\"{0}\" is not a valid investment type")]
    InvalidInvestmentType(String),

    /// An empty string was used as an investment name.
    #[error("Investment name cannot be empty")]
    EmptyInvestmentName,

    /// A required form field was missing or empty.
    #[error("the field \"{0}\" is required")]
    MissingField(&'static str),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The resource belongs to another user, or the user is not an admin.
    #[error("you are not allowed to access this resource")]
    Forbidden,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Transactions could not be written as CSV.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,

    /// Tried to update a user that does not exist
    #[error("tried to update a user that is not in the database")]
    UpdateMissingUser,

    /// Tried to delete a user that does not exist
    #[error("tried to delete a user that is not in the database")]
    DeleteMissingUser,

    /// Tried to delete a contact message that does not exist
    #[error("tried to delete a message that is not in the database")]
    DeleteMissingMessage,
}

impl Error {
    /// The class of failure this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidCredentials
            | Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::DuplicateEmail
            | Error::EmptyUsername
            | Error::InvalidRole(_)
            | Error::CannotDeleteSelf
            | Error::EmptyCategoryName
            | Error::DuplicateCategory
            | Error::InvalidCategory(_)
            | Error::CategoryTypeMismatch
            | Error::InvalidTransactionType(_)
            | Error::InvalidAmount(_)
            | Error::InvalidDateFormat(_)
            | Error::EmptyBudgetName
            | Error::InvalidInvestmentType(_)
            | Error::EmptyInvestmentName
            | Error::MissingField(_) => ErrorKind::Validation,
            Error::NotFound
            | Error::UpdateMissingBudget
            | Error::DeleteMissingBudget
            | Error::UpdateMissingUser
            | Error::DeleteMissingUser
            | Error::DeleteMissingMessage => ErrorKind::NotFound,
            Error::CookieMissing | Error::Forbidden => ErrorKind::Authorization,
            Error::HashingError(_)
            | Error::SqlError(_)
            | Error::InvalidTimezoneError(_)
            | Error::JSONSerializationError(_)
            | Error::CsvError(_)
            | Error::DatabaseLockError => ErrorKind::Persistence,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("idx_category_name") =>
            {
                Error::DuplicateCategory
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 787 => {
                Error::InvalidCategory(None)
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::Forbidden => ForbiddenError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            error if error.kind() == ErrorKind::Validation => InternalServerError {
                description: "Invalid request",
                fix: &error.to_string(),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let status_code = self.kind().status_code();

        let alert = match self {
            Error::InvalidTimezoneError(timezone) => Alert::Error {
                message: "Invalid Timezone Settings".to_owned(),
                details: format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            },
            Error::InvalidCategory(category_id) => Alert::Error {
                message: "Invalid category".to_owned(),
                details: match category_id {
                    Some(id) => format!("Could not find a category with the ID {id}."),
                    None => "Choose one of the existing categories.".to_owned(),
                },
            },
            Error::CategoryTypeMismatch => Alert::Error {
                message: "Category type mismatch".to_owned(),
                details: "Income transactions need an income category and expense \
                    transactions need an expense category."
                    .to_owned(),
            },
            Error::DuplicateCategory => Alert::Error {
                message: "Category already exists".to_owned(),
                details: "Choose a different name, or use the existing category.".to_owned(),
            },
            Error::InvalidDateFormat(date) => Alert::Error {
                message: "Invalid date format.".to_owned(),
                details: format!("Could not read \"{date}\" as a date, use YYYY-MM-DD."),
            },
            Error::CannotDeleteSelf => Alert::Error {
                message: "Could not delete user".to_owned(),
                details: "You cannot delete your own account!".to_owned(),
            },
            Error::Forbidden => Alert::Error {
                message: "Unauthorized action.".to_owned(),
                details: "You do not have permission to do that.".to_owned(),
            },
            Error::UpdateMissingBudget => Alert::Error {
                message: "Could not update budget".to_owned(),
                details: "The budget could not be found.".to_owned(),
            },
            Error::DeleteMissingBudget => Alert::Error {
                message: "Could not delete budget".to_owned(),
                details: "The budget could not be found. \
                    Try refreshing the page to see if the budget has already been deleted."
                    .to_owned(),
            },
            Error::UpdateMissingUser => Alert::Error {
                message: "Could not update user".to_owned(),
                details: "The user could not be found.".to_owned(),
            },
            Error::DeleteMissingUser => Alert::Error {
                message: "Could not delete user".to_owned(),
                details: "The user could not be found. \
                    Try refreshing the page to see if the user has already been deleted."
                    .to_owned(),
            },
            Error::DeleteMissingMessage => Alert::Error {
                message: "Could not delete message".to_owned(),
                details: "The message could not be found. \
                    Try refreshing the page to see if the message has already been deleted."
                    .to_owned(),
            },
            error if error.kind() == ErrorKind::Validation => Alert::Error {
                message: "Invalid input".to_owned(),
                details: capitalise_first_char(&error.to_string()),
            },
            error if error.kind() == ErrorKind::NotFound => Alert::Error {
                message: "Not found".to_owned(),
                details: "The requested resource could not be found.".to_owned(),
            },
            error => {
                tracing::error!("An unexpected error occurred: {error}");

                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                }
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    first.to_uppercase().chain(chars).collect()
}
