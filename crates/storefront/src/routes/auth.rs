//! Google sign-in and session routes.
//!
//! - `GET /auth/google` stores a one-time state and redirects to Google
//! - `GET /auth/google/callback` verifies the state, signs the customer in
//!   and sends them back to the frontend
//! - `GET /auth/me` and `POST /auth/logout`

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use dokan_core::ProductId;
use dokan_shared::db::{CustomerRepository, RepositoryError, WishlistRepository};
use dokan_shared::models::Customer;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireCustomer, clear_current_customer, set_current_customer};
use crate::models::{CurrentCustomer, session_keys};
use crate::state::AppState;

/// Length of the OAuth state parameter.
const STATE_LENGTH: usize = 32;

/// Query parameters from the Google OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Generate a random alphanumeric string.
fn generate_random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Frontend URL that reports a sign-in failure.
fn login_error_url(frontend_url: &str, code: &str) -> String {
    format!("{frontend_url}/login?error={code}")
}

/// Start Google sign-in.
///
/// # Route
///
/// `GET /auth/google`
#[instrument(skip(state, session))]
pub async fn google_login(State(state): State<AppState>, session: Session) -> Response {
    let oauth_state = generate_random_string(STATE_LENGTH);

    if let Err(e) = session
        .insert(session_keys::GOOGLE_OAUTH_STATE, &oauth_state)
        .await
    {
        tracing::error!(error = %e, "Failed to store OAuth state in session");
        return Redirect::to(&login_error_url(&state.config().frontend_url, "session"))
            .into_response();
    }

    let url = state
        .google()
        .authorization_url(&state.config().google_redirect_uri(), &oauth_state);
    Redirect::to(&url).into_response()
}

/// Handle the Google OAuth callback.
///
/// # Route
///
/// `GET /auth/google/callback`
#[instrument(skip(state, session, query))]
pub async fn google_callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let frontend = state.config().frontend_url.clone();

    match complete_sign_in(&state, &session, query).await {
        Ok(customer) => {
            tracing::info!(customer_id = %customer.id, "Customer signed in with Google");
            Redirect::to(&frontend).into_response()
        }
        Err(code) => Redirect::to(&login_error_url(&frontend, code)).into_response(),
    }
}

/// Run the callback steps, returning an error code for the frontend.
async fn complete_sign_in(
    state: &AppState,
    session: &Session,
    query: CallbackQuery,
) -> std::result::Result<Customer, &'static str> {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Google OAuth error");
        return Err("access_denied");
    }

    let Some(code) = query.code else {
        tracing::warn!("Google OAuth callback missing code");
        return Err("missing_code");
    };

    // The stored state is single-use: remove it before comparing.
    let stored_state: Option<String> = session
        .remove(session_keys::GOOGLE_OAUTH_STATE)
        .await
        .ok()
        .flatten();
    if stored_state.is_none() || stored_state != query.state {
        tracing::warn!("Google OAuth state mismatch");
        return Err("invalid_state");
    }

    let redirect_uri = state.config().google_redirect_uri();
    let access_token = state
        .google()
        .exchange_code(&code, &redirect_uri)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to exchange Google OAuth code");
            e.code()
        })?;
    let profile = state
        .google()
        .fetch_profile(&access_token)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Failed to fetch Google profile");
            e.code()
        })?;

    let customer = CustomerRepository::new(state.pool())
        .upsert_google(&profile)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => "account_conflict",
            other => {
                tracing::error!(error = %other, "Failed to save customer");
                "server"
            }
        })?;

    let guest_wishlist: Vec<ProductId> = session
        .remove(session_keys::GUEST_WISHLIST)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

    if let Err(e) = set_current_customer(session, &CurrentCustomer::from(&customer)).await {
        tracing::error!(error = %e, "Failed to store customer in session");
        return Err("session");
    }
    set_sentry_user(&customer.id, Some(customer.email.as_str()));

    if !guest_wishlist.is_empty() {
        match WishlistRepository::new(state.pool())
            .merge(customer.id, &guest_wishlist)
            .await
        {
            Ok(merged) => tracing::debug!(merged, "Merged guest wishlist"),
            Err(e) => tracing::warn!(error = %e, "Failed to merge guest wishlist"),
        }
    }

    Ok(customer)
}

/// The signed-in customer.
///
/// # Route
///
/// `GET /auth/me`
#[instrument(skip(state, customer))]
pub async fn me(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Json<Customer>> {
    CustomerRepository::new(state.pool())
        .get(customer.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::Unauthorized("Please sign in to continue".to_string()))
}

/// Sign out and discard the session.
///
/// # Route
///
/// `POST /auth/logout`
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_customer(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_string() {
        let a = generate_random_string(STATE_LENGTH);
        let b = generate_random_string(STATE_LENGTH);
        assert_eq!(a.len(), STATE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_login_error_url() {
        assert_eq!(
            login_error_url("https://dokan.com.bd", "invalid_state"),
            "https://dokan.com.bd/login?error=invalid_state"
        );
    }
}
