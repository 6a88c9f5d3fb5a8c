//! The dashboard shows overall totals and charts of the user's transactions.

mod charts;
mod dashboard_page;

pub use dashboard_page::{DashboardState, get_dashboard_page};
