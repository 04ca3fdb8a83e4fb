//! Courier account management.
//!
//! Keys are write-only: responses carry a masked form, and updates that
//! leave a key blank keep the stored value. Changing accounts requires a
//! super admin.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use dokan_core::{CourierProvider, CourierSettingId};
use dokan_shared::db::{CourierSettingRepository, RepositoryError};
use dokan_shared::models::{CourierSetting, CourierSettingInput, mask_secret};

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireSuperAdmin};
use crate::state::AppState;
use crate::steadfast::SteadfastClient;

const MAX_NAME_CHARS: usize = 100;

fn not_found() -> AppError {
    AppError::NotFound("Courier setting not found".to_string())
}

fn or_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => not_found(),
        other => other.into(),
    }
}

/// A courier account as shown to admins.
#[derive(Debug, Serialize)]
pub struct CourierSettingResponse {
    pub id: CourierSettingId,
    pub provider: CourierProvider,
    pub name: String,
    pub api_key: String,
    pub secret_key: String,
    pub base_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CourierSetting> for CourierSettingResponse {
    fn from(s: CourierSetting) -> Self {
        Self {
            api_key: mask_secret(s.api_key.expose_secret()),
            secret_key: mask_secret(s.secret_key.expose_secret()),
            id: s.id,
            provider: s.provider,
            name: s.name,
            base_url: s.base_url,
            is_active: s.is_active,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Body of create and update requests.
#[derive(Deserialize)]
pub struct CourierSettingRequest {
    #[serde(default)]
    pub provider: Option<CourierProvider>,
    pub name: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Account balance reported by the courier.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub id: CourierSettingId,
    pub current_balance: Decimal,
}

fn non_blank_secret(value: Option<String>) -> Option<SecretString> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

fn parse_base_url(value: Option<String>) -> Result<Option<String>> {
    let Some(raw) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let parsed = url::Url::parse(&raw)
        .map_err(|e| AppError::BadRequest(format!("Invalid base URL: {e}")))?;
    if !matches!(parsed.scheme(), "https" | "http") {
        return Err(AppError::BadRequest(
            "Base URL must use http or https".to_string(),
        ));
    }
    Ok(Some(raw.trim_end_matches('/').to_string()))
}

impl CourierSettingRequest {
    /// Validate into repository input. New accounts must carry both keys.
    fn into_input(self, require_keys: bool) -> Result<CourierSettingInput> {
        let name = self.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::BadRequest(format!(
                "Name is required and must be at most {MAX_NAME_CHARS} characters"
            )));
        }

        let api_key = non_blank_secret(self.api_key);
        let secret_key = non_blank_secret(self.secret_key);
        if require_keys && (api_key.is_none() || secret_key.is_none()) {
            return Err(AppError::BadRequest(
                "API key and secret key are required".to_string(),
            ));
        }

        Ok(CourierSettingInput {
            provider: self.provider.unwrap_or(CourierProvider::Steadfast),
            name,
            api_key,
            secret_key,
            base_url: parse_base_url(self.base_url)?,
        })
    }
}

/// List courier accounts, the active one first.
///
/// # Route
///
/// `GET /api/courier-settings`
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<CourierSettingResponse>>> {
    let settings = CourierSettingRepository::new(state.pool()).list().await?;
    Ok(Json(settings.into_iter().map(Into::into).collect()))
}

/// Show one courier account.
///
/// # Route
///
/// `GET /api/courier-settings/{id}`
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<CourierSettingId>,
) -> Result<Json<CourierSettingResponse>> {
    CourierSettingRepository::new(state.pool())
        .get(id)
        .await?
        .map(|s| Json(s.into()))
        .ok_or_else(not_found)
}

/// Add a courier account. New accounts start inactive.
///
/// # Route
///
/// `POST /api/courier-settings`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Json(body): Json<CourierSettingRequest>,
) -> Result<(StatusCode, Json<CourierSettingResponse>)> {
    let input = body.into_input(true)?;
    let created = CourierSettingRepository::new(state.pool())
        .create(&input)
        .await?;
    tracing::info!(setting_id = %created.id, provider = %created.provider, "Courier account added");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Update a courier account. Blank keys keep the stored values.
///
/// # Route
///
/// `PUT /api/courier-settings/{id}`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<CourierSettingId>,
    Json(body): Json<CourierSettingRequest>,
) -> Result<Json<CourierSettingResponse>> {
    let input = body.into_input(false)?;
    let updated = CourierSettingRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found)?;
    tracing::info!(setting_id = %id, "Courier account updated");
    Ok(Json(updated.into()))
}

/// Delete a courier account.
///
/// # Route
///
/// `DELETE /api/courier-settings/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<CourierSettingId>,
) -> Result<StatusCode> {
    CourierSettingRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found)?;
    tracing::info!(setting_id = %id, "Courier account deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Make this the only active courier account.
///
/// # Route
///
/// `POST /api/courier-settings/{id}/activate`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn activate(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<CourierSettingId>,
) -> Result<Json<CourierSettingResponse>> {
    let setting = CourierSettingRepository::new(state.pool())
        .set_active(id)
        .await
        .map_err(or_not_found)?;
    tracing::info!(setting_id = %id, "Courier account activated");
    Ok(Json(setting.into()))
}

/// Deactivate a courier account. Dispatch is unavailable until another is
/// activated.
///
/// # Route
///
/// `POST /api/courier-settings/{id}/deactivate`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn deactivate(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<CourierSettingId>,
) -> Result<Json<CourierSettingResponse>> {
    let setting = CourierSettingRepository::new(state.pool())
        .deactivate(id)
        .await
        .map_err(or_not_found)?;
    tracing::info!(setting_id = %id, "Courier account deactivated");
    Ok(Json(setting.into()))
}

/// Fetch the account balance, which also checks the credentials.
///
/// # Route
///
/// `GET /api/courier-settings/{id}/balance`
#[instrument(skip(state, _admin))]
pub async fn balance(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<CourierSettingId>,
) -> Result<Json<BalanceResponse>> {
    let setting = CourierSettingRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(not_found)?;

    let client = SteadfastClient::new(state.http().clone(), &setting);
    let current_balance = client.balance().await?;
    Ok(Json(BalanceResponse {
        id,
        current_balance,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(api_key: Option<&str>, base_url: Option<&str>) -> CourierSettingRequest {
        CourierSettingRequest {
            provider: None,
            name: " Main account ".to_string(),
            api_key: api_key.map(str::to_string),
            secret_key: api_key.map(str::to_string),
            base_url: base_url.map(str::to_string),
        }
    }

    #[test]
    fn test_create_requires_keys() {
        assert!(request(None, None).into_input(true).is_err());
        assert!(request(Some("  "), None).into_input(true).is_err());

        let input = request(Some("key-123"), None).into_input(true).unwrap();
        assert_eq!(input.name, "Main account");
        assert_eq!(input.provider, CourierProvider::Steadfast);
        assert_eq!(input.api_key.unwrap().expose_secret(), "key-123");
    }

    #[test]
    fn test_update_keeps_blank_keys() {
        let input = request(Some(""), None).into_input(false).unwrap();
        assert!(input.api_key.is_none());
        assert!(input.secret_key.is_none());
    }

    #[test]
    fn test_base_url_validation() {
        let input = request(Some("k"), Some("https://sandbox.packzy.com/api/v1/"))
            .into_input(true)
            .unwrap();
        assert_eq!(
            input.base_url.as_deref(),
            Some("https://sandbox.packzy.com/api/v1")
        );

        assert!(request(Some("k"), Some("ftp://example.com")).into_input(true).is_err());
        assert!(request(Some("k"), Some("not a url")).into_input(true).is_err());
        assert!(request(Some("k"), Some(" ")).into_input(true).unwrap().base_url.is_none());
    }
}
