//! User accounts, sessions and the middleware that guards protected routes.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod principal;
mod redirect;
mod register_user;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub(crate) use cookie::get_token_from_cookies;
#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, admin_guard, admin_guard_hx, auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use principal::Principal;
pub use register_user::{get_register_page, register_user};
pub use user::{
    Email, Role, User, UserID, count_admins, count_users, create_user, create_user_table,
    delete_user, get_all_users, get_user_by_email, get_user_by_id, set_user_password,
    set_user_role,
};
