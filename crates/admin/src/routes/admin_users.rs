//! Admin account management (super admin only).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use dokan_core::{AdminRole, AdminUserId, Email};
use dokan_shared::db::AdminUserRepository;
use dokan_shared::models::AdminUser;

use crate::auth::{hash_password, validate_new_password};
use crate::error::{AppError, Result};
use crate::middleware::RequireSuperAdmin;
use crate::state::AppState;

/// Longest display name accepted.
const MAX_NAME: usize = 100;

/// Body of `POST /api/admin-users`.
#[derive(Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: AdminRole,
    pub password: String,
}

const fn default_role() -> AdminRole {
    AdminRole::Admin
}

/// List every admin account.
///
/// # Route
///
/// `GET /api/admin-users`
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
) -> Result<Json<Vec<AdminUser>>> {
    Ok(Json(AdminUserRepository::new(state.pool()).list().await?))
}

/// Create an admin account.
///
/// # Route
///
/// `POST /api/admin-users`
#[instrument(skip(state, admin, body), fields(created_by = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Json(body): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AdminUser>)> {
    let email = Email::parse(&body.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let name = body.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME {
        return Err(AppError::BadRequest(format!(
            "Name is required and must be at most {MAX_NAME} characters"
        )));
    }
    validate_new_password(&body.password)?;

    let hash = hash_password(&body.password)?;
    let created = AdminUserRepository::new(state.pool())
        .create(&email, name, body.role, &hash)
        .await?;

    tracing::info!(admin_id = %created.id, role = %created.role, "Admin account created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Delete an admin account. Admins cannot delete themselves.
///
/// # Route
///
/// `DELETE /api/admin-users/{id}`
#[instrument(skip(state, admin), fields(deleted_by = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<AdminUserId>,
) -> Result<StatusCode> {
    if id == admin.id {
        return Err(AppError::Conflict(
            "You cannot delete your own account".to_string(),
        ));
    }

    AdminUserRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            dokan_shared::db::RepositoryError::NotFound => {
                AppError::NotFound("Admin user not found".to_string())
            }
            other => other.into(),
        })?;

    tracing::info!(admin_id = %id, "Admin account deleted");
    Ok(StatusCode::NO_CONTENT)
}
