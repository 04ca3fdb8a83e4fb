//! Courier actions on orders.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use dokan_core::OrderId;
use dokan_shared::models::Order;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::courier::{self, SyncReport};
use crate::state::AppState;

/// Body of `POST /api/orders/{id}/courier/cancel`.
#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Send an order to the active courier account.
///
/// # Route
///
/// `POST /api/orders/{id}/courier`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn dispatch(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(courier::dispatch(&state, id).await?))
}

/// Refresh an order's delivery status.
///
/// # Route
///
/// `POST /api/orders/{id}/courier/sync`
#[instrument(skip(state, _admin))]
pub async fn sync(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(courier::sync_order(&state, id).await?))
}

/// Request a return from the courier and cancel the order.
///
/// # Route
///
/// `POST /api/orders/{id}/courier/cancel`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    body: Option<Json<CancelRequest>>,
) -> Result<Json<Order>> {
    let reason = body
        .and_then(|Json(b)| b.reason)
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    Ok(Json(courier::cancel(&state, id, reason).await?))
}

/// Refresh every dispatched open order.
///
/// # Route
///
/// `POST /api/courier/sync`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn sync_all(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<SyncReport>> {
    Ok(Json(courier::sync_all(&state).await?))
}
