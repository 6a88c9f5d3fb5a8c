use crate::auth::{Role, UserID};

/// The authenticated user making a request.
///
/// Resolved once per request by [auth_guard](crate::auth::auth_guard) and placed in the
/// request extensions. Handlers receive it with `Extension(principal): Extension<Principal>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserID,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
