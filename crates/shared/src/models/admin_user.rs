//! Back-office account types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use dokan_core::{AdminRole, AdminUserId, Email};

/// An admin user.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An admin user together with their stored password hash, for login.
///
/// Never serialized.
#[derive(Clone)]
pub struct AdminLogin {
    pub user: AdminUser,
    pub password_hash: String,
}

impl std::fmt::Debug for AdminLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminLogin")
            .field("user", &self.user)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}
