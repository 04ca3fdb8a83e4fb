//! Authentication extractors for admin.
//!
//! The admin token is read from the `dokan_admin_token` cookie set at login,
//! or from an `Authorization: Bearer` header for scripted clients. The
//! admin is reloaded from the database on every request, so deleted
//! accounts lose access immediately and role changes take effect at once.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use cookie::{Cookie, SameSite, time::Duration as CookieDuration};

use dokan_shared::db::AdminUserRepository;
use dokan_shared::models::AdminUser;

use crate::auth::JwtError;
use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Name of the cookie holding the admin token.
pub const ADMIN_COOKIE: &str = "dokan_admin_token";

/// Extractor that requires a signed-in admin, rejecting with 401.
///
/// ```rust,ignore
/// async fn handler(RequireAdmin(admin): RequireAdmin) -> String {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub AdminUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Cached per request so stacked extractors hit the database once.
        if let Some(admin) = parts.extensions.get::<AdminUser>() {
            return Ok(Self(admin.clone()));
        }

        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let claims = state.jwt().verify(&token).map_err(|e| match e {
            JwtError::Expired => AppError::Unauthorized("Session expired".to_string()),
            _ => AppError::Unauthorized("Invalid token".to_string()),
        })?;

        let admin = AdminUserRepository::new(state.pool())
            .get(claims.admin_id())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

        tracing::Span::current().record("admin_id", admin.id.as_i32());
        set_sentry_user(&admin.id, admin.email.as_str());

        parts.extensions.insert(admin.clone());
        Ok(Self(admin))
    }
}

/// Extractor that requires a super admin, rejecting with 403 otherwise.
pub struct RequireSuperAdmin(pub AdminUser);

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAdmin(admin) = RequireAdmin::from_request_parts(parts, state).await?;

        if !admin.role.is_super_admin() {
            return Err(AppError::Forbidden("Super admin access required".to_string()));
        }

        Ok(Self(admin))
    }
}

/// The admin token from the cookie, falling back to a bearer header.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == ADMIN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
    })
}

/// Login cookie carrying `token` for `ttl`.
#[must_use]
pub fn token_cookie(token: String, ttl: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((ADMIN_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .path("/")
        .max_age(CookieDuration::seconds(ttl.num_seconds()))
        .build()
}

/// Cookie that clears the login cookie.
#[must_use]
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((ADMIN_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .path("/")
        .build();
    cookie.make_removal();
    cookie
}

/// `Set-Cookie` header value for `cookie`.
///
/// # Errors
///
/// Returns `AppError::Internal` if the cookie is not a valid header value.
pub fn set_cookie_header(cookie: &Cookie<'_>) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))
}
