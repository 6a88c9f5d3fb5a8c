//! The admin panel: site statistics, user management and contact messages.
//!
//! Every route in here sits behind [crate::auth::admin_guard].

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod dashboard_page;
mod messages_page;
mod users_page;

pub use dashboard_page::get_admin_dashboard_page;
pub use messages_page::{delete_message_endpoint, get_admin_messages_page};
pub use users_page::{delete_user_endpoint, get_admin_users_page, toggle_user_role_endpoint};

/// The state needed by the admin pages.
#[derive(Debug, Clone)]
pub struct AdminState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AdminState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
