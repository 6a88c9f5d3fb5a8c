//! Ledgerly is a web app for tracking personal income, expenses, budgets and investments.
//!
//! This library provides a REST API that directly serves HTML pages.
//! Recurring transactions are created lazily: each authenticated request first
//! materializes any occurrences of the user's recurring transactions that are due.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod admin;
mod aggregation;
mod alert;
mod app_state;
mod auth;
mod budget;
mod category;
mod contact;
mod dashboard;
mod db;
mod endpoints;
mod error;
mod forbidden;
mod html;
mod internal_server_error;
mod investment;
mod logging;
mod navigation;
mod not_found;
mod recurrence;
mod routing;
mod timezone;
mod transaction;
mod transaction_type;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    Email, PasswordHash, Role, User, UserID, ValidatedPassword, create_user, get_user_by_email,
    set_user_password, set_user_role,
};
pub use budget::{NewBudget, create_budget};
pub use category::{Category, get_categories_for_user};
pub use contact::create_contact_message;
pub use db::initialize as initialize_db;
pub use error::{Error, ErrorKind};
pub use investment::{InvestmentDetails, NewInvestment, create_investment};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use recurrence::Frequency;
pub use routing::build_router;
pub use timezone::{DEFAULT_TIMEZONE, local_now};
pub use transaction::{Transaction, create_transaction};
pub use transaction_type::TransactionType;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
