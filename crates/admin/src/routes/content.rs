//! Navbar and footer editing.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use dokan_core::NavbarItemId;
use dokan_shared::db::{ContentRepository, RepositoryError};
use dokan_shared::models::{Footer, FooterInput, NavbarItem, NavbarItemInput};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

fn or_item_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Navbar item not found".to_string()),
        other => other.into(),
    }
}

/// Body of `PUT /api/navbar/order`.
#[derive(Debug, Deserialize)]
pub struct NavbarOrder {
    pub ids: Vec<NavbarItemId>,
}

impl NavbarOrder {
    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.ids.iter().find(|id| !seen.insert(**id)) {
            return Err(AppError::BadRequest(format!(
                "Navbar item {dup} is listed twice"
            )));
        }
        Ok(())
    }
}

/// All navbar items, hidden ones included.
///
/// # Route
///
/// `GET /api/navbar`
#[instrument(skip(state, _admin))]
pub async fn list_navbar(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<NavbarItem>>> {
    Ok(Json(
        ContentRepository::new(state.pool()).list_navbar(false).await?,
    ))
}

/// Add a navbar item.
///
/// # Route
///
/// `POST /api/navbar`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create_navbar_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<NavbarItemInput>,
) -> Result<(StatusCode, Json<NavbarItem>)> {
    input.validate().map_err(AppError::BadRequest)?;
    let item = ContentRepository::new(state.pool())
        .create_navbar_item(&input)
        .await?;
    tracing::info!(navbar_item_id = %item.id, "Navbar item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// Replace a navbar item.
///
/// # Route
///
/// `PUT /api/navbar/{id}`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_navbar_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<NavbarItemId>,
    Json(input): Json<NavbarItemInput>,
) -> Result<Json<NavbarItem>> {
    input.validate().map_err(AppError::BadRequest)?;
    let item = ContentRepository::new(state.pool())
        .update_navbar_item(id, &input)
        .await
        .map_err(or_item_not_found)?;
    tracing::info!(navbar_item_id = %id, "Navbar item updated");
    Ok(Json(item))
}

/// Delete a navbar item.
///
/// # Route
///
/// `DELETE /api/navbar/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_navbar_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<NavbarItemId>,
) -> Result<StatusCode> {
    ContentRepository::new(state.pool())
        .delete_navbar_item(id)
        .await
        .map_err(or_item_not_found)?;
    tracing::info!(navbar_item_id = %id, "Navbar item deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Reorder navbar items. Listed items come first, in the given order.
///
/// # Route
///
/// `PUT /api/navbar/order`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn reorder_navbar(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<NavbarOrder>,
) -> Result<Json<Vec<NavbarItem>>> {
    body.validate()?;
    let items = ContentRepository::new(state.pool())
        .reorder_navbar(&body.ids)
        .await
        .map_err(or_item_not_found)?;
    Ok(Json(items))
}

/// The footer. 404 until it has been saved once.
///
/// # Route
///
/// `GET /api/footer`
#[instrument(skip(state, _admin))]
pub async fn footer(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Footer>> {
    ContentRepository::new(state.pool())
        .get_footer()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Footer has not been set up".to_string()))
}

/// Replace the footer.
///
/// # Route
///
/// `PUT /api/footer`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_footer(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<FooterInput>,
) -> Result<Json<Footer>> {
    if input.quick_links.iter().any(|l| l.url.trim().is_empty())
        || input.social_links.iter().any(|l| l.url.trim().is_empty())
    {
        return Err(AppError::BadRequest("Footer links need a URL".to_string()));
    }

    let footer = ContentRepository::new(state.pool())
        .upsert_footer(&input)
        .await?;
    tracing::info!("Footer updated");
    Ok(Json(footer))
}
