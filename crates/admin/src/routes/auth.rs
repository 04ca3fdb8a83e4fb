//! Admin sign-in routes.
//!
//! - `POST /admin/login` checks email and password, sets the token cookie
//!   and also returns the token for non-browser clients
//! - `GET /admin/verify` reports who the token belongs to
//! - `POST /admin/logout` expires the cookie
//! - `PUT /admin/password` changes the signed-in admin's password

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use dokan_core::Email;
use dokan_shared::db::AdminUserRepository;
use dokan_shared::models::AdminUser;

use crate::auth::{hash_password, validate_new_password, verify_against_dummy, verify_password};
use crate::error::{AppError, Result, set_sentry_user};
use crate::middleware::RequireAdmin;
use crate::middleware::auth::{removal_cookie, set_cookie_header, token_cookie};
use crate::state::AppState;

/// Message for any failed login, so accounts cannot be enumerated.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub admin: AdminUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub admin: AdminUser,
}

/// Password change request body.
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Sign in with email and password.
///
/// # Route
///
/// `POST /admin/login`
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response> {
    let invalid = || AppError::Unauthorized(INVALID_CREDENTIALS.to_string());

    let login = match Email::parse(&body.email) {
        Ok(email) => AdminUserRepository::new(state.pool()).get_login(&email).await?,
        Err(_) => None,
    };
    let Some(login) = login else {
        // Same argon2 cost as a wrong password for a real account.
        let _ = verify_against_dummy(&body.password);
        return Err(invalid());
    };

    if !verify_password(&body.password, &login.password_hash)? {
        tracing::warn!(admin_id = %login.user.id, "Failed admin login");
        return Err(invalid());
    }

    let admin = login.user;
    let token = state
        .jwt()
        .issue(&admin)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let ttl = state.jwt().ttl();
    let cookie = token_cookie(token.clone(), ttl, state.config().is_secure());

    set_sentry_user(&admin.id, admin.email.as_str());
    tracing::info!(admin_id = %admin.id, role = %admin.role, "Admin signed in");

    let body = LoginResponse {
        admin,
        token,
        expires_at: Utc::now() + ttl,
    };
    Ok((
        [(header::SET_COOKIE, set_cookie_header(&cookie)?)],
        Json(body),
    )
        .into_response())
}

/// Who is signed in.
///
/// # Route
///
/// `GET /admin/verify`
#[instrument(skip(admin))]
pub async fn verify(RequireAdmin(admin): RequireAdmin) -> Json<VerifyResponse> {
    Json(VerifyResponse { admin })
}

/// Sign out by expiring the token cookie. Tokens are stateless, so a
/// copied bearer token stays valid until it expires.
///
/// # Route
///
/// `POST /admin/logout`
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<Response> {
    let cookie = removal_cookie(state.config().is_secure());
    sentry::configure_scope(|scope| scope.set_user(None));
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, set_cookie_header(&cookie)?)],
    )
        .into_response())
}

/// Change the signed-in admin's own password.
///
/// # Route
///
/// `PUT /admin/password`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    let repo = AdminUserRepository::new(state.pool());
    let login = repo
        .get_login_by_id(admin.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    if !verify_password(&body.current_password, &login.password_hash)? {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }
    if body.new_password == body.current_password {
        return Err(AppError::BadRequest(
            "New password must differ from the current one".to_string(),
        ));
    }
    validate_new_password(&body.new_password)?;

    let hash = hash_password(&body.new_password)?;
    repo.update_password(admin.id, &hash).await?;

    tracing::info!("Admin password changed");
    Ok(StatusCode::NO_CONTENT)
}
