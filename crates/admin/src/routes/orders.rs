//! Order management and the dashboard.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use dokan_core::{DeliveryArea, OrderId, OrderStatus, PhoneNumber};
use dokan_shared::db::{OrderRepository, ProductRepository, RepositoryError};
use dokan_shared::models::{
    Order, OrderDetailsUpdate, OrderFilter, OrderStats, Page, Product, clamp_paging,
};
use dokan_shared::receipt::content_disposition;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const MAX_NAME_CHARS: usize = 100;
const MAX_ADDRESS_CHARS: usize = 500;
const MAX_CITY_CHARS: usize = 100;
const MAX_NOTE_CHARS: usize = 1000;

/// Orders shown on the dashboard.
const RECENT_ORDERS: i64 = 5;

pub(crate) fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

/// Map a missing row to the order-specific 404.
pub(crate) fn or_order_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => order_not_found(),
        other => other.into(),
    }
}

/// Query parameters for `GET /api/orders`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// Order number, customer name or phone.
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Body of `PATCH /api/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Body of `PUT /api/orders/{id}`.
#[derive(Debug, Deserialize)]
pub struct DetailsRequest {
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub delivery_area: DeliveryArea,
    #[serde(default)]
    pub note: Option<String>,
    /// Keeps the current charge when absent.
    #[serde(default)]
    pub shipping_charge: Option<Decimal>,
}

fn check_len(value: &str, field: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

impl DetailsRequest {
    fn into_update(self, current_shipping: Decimal) -> Result<OrderDetailsUpdate> {
        check_len(&self.customer_name, "Name", MAX_NAME_CHARS)?;
        check_len(&self.address, "Address", MAX_ADDRESS_CHARS)?;
        check_len(&self.city, "City", MAX_CITY_CHARS)?;
        let phone =
            PhoneNumber::parse(&self.phone).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let note = self
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if note
            .as_ref()
            .is_some_and(|n| n.chars().count() > MAX_NOTE_CHARS)
        {
            return Err(AppError::BadRequest(format!(
                "Note must be at most {MAX_NOTE_CHARS} characters"
            )));
        }

        let shipping_charge = self.shipping_charge.unwrap_or(current_shipping);
        if shipping_charge.is_sign_negative() {
            return Err(AppError::BadRequest(
                "Shipping charge cannot be negative".to_string(),
            ));
        }

        Ok(OrderDetailsUpdate {
            customer_name: self.customer_name,
            phone,
            address: self.address,
            city: self.city,
            delivery_area: self.delivery_area,
            note,
            shipping_charge: shipping_charge.round_dp(2),
        })
    }
}

/// Dashboard payload.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub stats: OrderStats,
    pub low_stock_threshold: i32,
    pub low_stock: Vec<Product>,
    pub recent_orders: Vec<Order>,
}

/// List orders, newest first.
///
/// # Route
///
/// `GET /api/orders`
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Page<Order>>> {
    let (page, per_page) = clamp_paging(query.page, query.per_page);
    let filter = OrderFilter {
        status: query.status,
        search: query.search.filter(|s| !s.trim().is_empty()),
        customer_id: None,
        page,
        per_page,
    };
    Ok(Json(OrderRepository::new(state.pool()).list(&filter).await?))
}

/// Show one order with its lines.
///
/// # Route
///
/// `GET /api/orders/{id}`
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(order_not_found)
}

/// Validate a manual status change. Closing an order that the courier still
/// holds would leave the parcel in transit with no local tracking.
fn check_status_change(from: OrderStatus, to: OrderStatus, consignment_live: bool) -> Result<()> {
    if !from.can_transition_to(to) {
        return Err(AppError::Conflict(format!(
            "Cannot change status from {from} to {to}"
        )));
    }
    if consignment_live && from != to && !to.is_open() {
        return Err(AppError::Conflict(format!(
            "Order is with the courier; cancel it via POST /api/orders/{{id}}/courier/cancel \
             before marking it {to}"
        )));
    }
    Ok(())
}

/// Move an order to a new status, enforcing the allowed transitions.
///
/// # Route
///
/// `PATCH /api/orders/{id}/status`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let repo = OrderRepository::new(state.pool());
    let order = repo.get(id).await?.ok_or_else(order_not_found)?;

    check_status_change(order.status, body.status, order.has_active_consignment())?;
    if order.status == body.status {
        return Ok(Json(order));
    }

    let updated = repo
        .update_status(id, body.status)
        .await
        .map_err(or_order_not_found)?;
    tracing::info!(
        order_id = %id,
        from = %order.status,
        to = %body.status,
        "Order status changed"
    );
    Ok(Json(updated))
}

/// Edit delivery details. Refused once the parcel is with the courier.
///
/// # Route
///
/// `PUT /api/orders/{id}`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_details(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<DetailsRequest>,
) -> Result<Json<Order>> {
    let repo = OrderRepository::new(state.pool());
    let order = repo.get(id).await?.ok_or_else(order_not_found)?;

    if order.has_active_consignment() {
        return Err(AppError::Conflict(
            "Order has already been handed to the courier".to_string(),
        ));
    }
    if !order.status.is_open() {
        return Err(AppError::Conflict(format!(
            "Cannot edit a {} order",
            order.status
        )));
    }

    let update = body.into_update(order.shipping_charge)?;
    let updated = repo
        .update_details(id, &update)
        .await
        .map_err(or_order_not_found)?;
    tracing::info!(order_id = %id, "Order details updated");
    Ok(Json(updated))
}

/// Delete an order. Refused while a courier consignment is live.
///
/// # Route
///
/// `DELETE /api/orders/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    let repo = OrderRepository::new(state.pool());
    let order = repo.get(id).await?.ok_or_else(order_not_found)?;

    if order.has_active_consignment() && order.status.is_open() {
        return Err(AppError::Conflict(
            "Cancel the courier consignment before deleting this order".to_string(),
        ));
    }

    repo.delete(id).await.map_err(or_order_not_found)?;
    tracing::info!(order_id = %id, order_number = %order.order_number, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Download an order's PDF receipt.
///
/// # Route
///
/// `GET /api/orders/{id}/receipt`
#[instrument(skip(state, _admin))]
pub async fn receipt(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(order_not_found)?;

    let renderer = state.receipts().clone();
    let order_number = order.order_number.clone();
    let pdf = tokio::task::spawn_blocking(move || renderer.render(&order))
        .await
        .map_err(|e| AppError::Internal(format!("receipt task failed: {e}")))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&order_number)),
            (header::CACHE_CONTROL, "private, no-store".to_string()),
        ],
        pdf,
    )
        .into_response())
}

/// Store figures, low-stock products and the latest orders.
///
/// # Route
///
/// `GET /api/dashboard`
#[instrument(skip(state, _admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Dashboard>> {
    let threshold = state.config().low_stock_threshold;
    let orders = OrderRepository::new(state.pool());

    let stats = orders.stats(threshold).await?;
    let low_stock = ProductRepository::new(state.pool()).low_stock(threshold).await?;
    let recent = orders
        .list(&OrderFilter {
            per_page: RECENT_ORDERS,
            ..OrderFilter::default()
        })
        .await?;

    Ok(Json(Dashboard {
        stats,
        low_stock_threshold: threshold,
        low_stock,
        recent_orders: recent.items,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn details() -> DetailsRequest {
        DetailsRequest {
            customer_name: "Karim Ahmed".to_string(),
            phone: "+8801812345678".to_string(),
            address: "Flat 3B, Road 11, Banani".to_string(),
            city: "Dhaka".to_string(),
            delivery_area: DeliveryArea::InsideDhaka,
            note: Some("   ".to_string()),
            shipping_charge: None,
        }
    }

    #[test]
    fn test_details_keep_shipping_and_drop_blank_note() {
        let update = details().into_update(Decimal::from(60)).unwrap();
        assert_eq!(update.shipping_charge, Decimal::from(60));
        assert_eq!(update.note, None);
        assert_eq!(update.phone.as_str(), "01812345678");
    }

    #[test]
    fn test_status_change_rules() {
        assert!(check_status_change(OrderStatus::Pending, OrderStatus::Confirmed, false).is_ok());
        assert!(check_status_change(OrderStatus::Pending, OrderStatus::Cancelled, false).is_ok());
        assert!(matches!(
            check_status_change(OrderStatus::Cancelled, OrderStatus::Pending, false),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_status_change_blocked_while_courier_holds_parcel() {
        for to in [
            OrderStatus::Cancelled,
            OrderStatus::Delivered,
            OrderStatus::Returned,
        ] {
            assert!(
                matches!(
                    check_status_change(OrderStatus::Shipped, to, true),
                    Err(AppError::Conflict(_))
                ),
                "{to}"
            );
            assert!(check_status_change(OrderStatus::Shipped, to, false).is_ok(), "{to}");
        }
        assert!(check_status_change(OrderStatus::Shipped, OrderStatus::Processing, true).is_ok());
        assert!(check_status_change(OrderStatus::Shipped, OrderStatus::Shipped, true).is_ok());
    }

    #[test]
    fn test_details_validation() {
        let mut bad = details();
        bad.address = " ".to_string();
        assert!(bad.into_update(Decimal::ZERO).is_err());

        let mut bad = details();
        bad.phone = "12345".to_string();
        assert!(bad.into_update(Decimal::ZERO).is_err());

        let mut bad = details();
        bad.shipping_charge = Some(Decimal::from(-1));
        assert!(bad.into_update(Decimal::ZERO).is_err());
    }
}
