//! Courier workflow: dispatching orders to Steadfast and keeping their
//! delivery status current.
//!
//! Steadfast is the source of truth for delivery progress. Statuses are
//! pulled (per order, in bulk, or by the background poller) and mapped onto
//! the order lifecycle, never against the allowed transitions.

use std::time::Duration;

use futures::{StreamExt, stream};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::instrument;

use dokan_core::{CourierDeliveryStatus, CourierProvider, OrderId, OrderStatus};
use dokan_shared::db::OrderRepository;
use dokan_shared::models::Order;

use crate::error::{AppError, Result};
use crate::routes::orders::{or_order_not_found, order_not_found};
use crate::state::AppState;
use crate::steadfast::{CreateOrderRequest, StatusLookup, SteadfastClient, SteadfastError};

/// Steadfast lookups in flight at once during a bulk sync.
pub const SYNC_CONCURRENCY: usize = 4;

/// Orders examined per bulk sync, oldest update first.
pub const SYNC_BATCH: i64 = 200;

/// Outcome of a bulk sync.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub checked: usize,
    pub updated: usize,
    pub failed: Vec<SyncFailure>,
}

/// One order that could not be synced.
#[derive(Debug, Serialize)]
pub struct SyncFailure {
    pub order_id: OrderId,
    pub order_number: String,
    pub error: String,
}

/// The order status a courier report should move `current` to, if any.
///
/// Reports that would break the transition rules (for example a late
/// "pending" for a delivered order) are ignored.
#[must_use]
pub fn next_order_status(
    current: OrderStatus,
    courier: CourierDeliveryStatus,
) -> Option<OrderStatus> {
    courier
        .order_status()
        .filter(|next| *next != current && current.can_transition_to(*next))
}

/// Hand an order to the active courier. The order becomes shipped.
///
/// # Errors
///
/// - `AppError::NotFound` if the order does not exist
/// - `AppError::Conflict` if it is already dispatched or no longer open
/// - `AppError::PreconditionFailed` if no courier account is active
/// - `AppError::Courier` if Steadfast refuses the parcel
#[instrument(skip(state))]
pub async fn dispatch(state: &AppState, id: OrderId) -> Result<Order> {
    let repo = OrderRepository::new(state.pool());
    let order = repo.get(id).await?.ok_or_else(order_not_found)?;

    if order.has_active_consignment() {
        return Err(AppError::Conflict(
            "Order has already been sent to the courier".to_string(),
        ));
    }
    if !order.status.is_open() {
        return Err(AppError::Conflict(format!(
            "Cannot send a {} order to the courier",
            order.status
        )));
    }

    let client = state.active_courier().await?;
    let request = CreateOrderRequest::from_order(&order)?;
    let consignment = client.create_order(&request).await?;

    let updated = repo
        .record_consignment(
            id,
            CourierProvider::Steadfast,
            consignment.consignment_id,
            &consignment.tracking_code,
            consignment.delivery_status(),
            OrderStatus::Shipped,
        )
        .await
        .map_err(or_order_not_found)?;

    tracing::info!(
        order_id = %id,
        consignment_id = consignment.consignment_id,
        tracking_code = %consignment.tracking_code,
        "Order dispatched to courier"
    );
    Ok(updated)
}

/// References to try for a dispatched order, most specific first.
fn status_lookups<'a>(
    consignment_id: Option<i64>,
    tracking_code: Option<&'a str>,
    invoice: &'a str,
) -> Vec<StatusLookup<'a>> {
    let mut lookups: Vec<StatusLookup<'a>> =
        consignment_id.map(StatusLookup::Consignment).into_iter().collect();
    if let Some(code) = tracking_code.filter(|c| !c.trim().is_empty()) {
        lookups.push(StatusLookup::TrackingCode(code));
    }
    lookups.push(StatusLookup::Invoice(invoice));
    lookups
}

/// Ask Steadfast for a parcel's status, falling back to the tracking code
/// and then the invoice when a reference is unknown to it.
async fn fetch_status(
    client: &SteadfastClient,
    order: &Order,
) -> std::result::Result<String, SteadfastError> {
    let mut last_error = None;
    for lookup in status_lookups(
        order.consignment_id,
        order.tracking_code.as_deref(),
        &order.order_number,
    ) {
        match client.status(lookup).await {
            Err(e) if e.is_not_found() => {
                tracing::debug!(order_id = %order.id, ?lookup, "Courier lookup not found");
                last_error = Some(e);
            }
            other => return other,
        }
    }
    Err(last_error.unwrap_or_else(|| {
        SteadfastError::InvalidRequest("Order has no courier reference".to_string())
    }))
}

/// Pull one order's delivery status. Returns the order and whether
/// anything changed.
async fn sync_with(
    repo: &OrderRepository<'_>,
    client: &SteadfastClient,
    order: &Order,
) -> Result<(Order, bool)> {
    if order.consignment_id.is_none() {
        return Err(AppError::Conflict(
            "Order has not been sent to the courier".to_string(),
        ));
    }

    let reported = fetch_status(client, order).await?;
    let courier_status = CourierDeliveryStatus::parse_lenient(&reported);
    if courier_status == CourierDeliveryStatus::Unknown {
        tracing::warn!(order_id = %order.id, reported = %reported, "Unrecognized courier status");
    }

    let next = next_order_status(order.status, courier_status);
    let changed = order.courier_status != Some(courier_status) || next.is_some();

    let updated = repo
        .record_courier_status(order.id, courier_status, next)
        .await
        .map_err(or_order_not_found)?;

    if let Some(next) = next {
        tracing::info!(
            order_id = %order.id,
            from = %order.status,
            to = %next,
            courier_status = %courier_status,
            "Order status updated from courier"
        );
    }
    Ok((updated, changed))
}

/// Refresh one order's delivery status from the courier.
///
/// # Errors
///
/// - `AppError::NotFound` if the order does not exist
/// - `AppError::Conflict` if it was never dispatched
/// - `AppError::PreconditionFailed` if no courier account is active
/// - `AppError::Courier` if the lookup fails
#[instrument(skip(state))]
pub async fn sync_order(state: &AppState, id: OrderId) -> Result<Order> {
    let repo = OrderRepository::new(state.pool());
    let order = repo.get(id).await?.ok_or_else(order_not_found)?;
    if order.consignment_id.is_none() {
        return Err(AppError::Conflict(
            "Order has not been sent to the courier".to_string(),
        ));
    }

    let client = state.active_courier().await?;
    let (updated, _) = sync_with(&repo, &client, &order).await?;
    Ok(updated)
}

/// Ask the courier to return a dispatched parcel and cancel the order.
///
/// # Errors
///
/// - `AppError::NotFound` if the order does not exist
/// - `AppError::Conflict` if there is no live consignment or the order is
///   already closed
/// - `AppError::PreconditionFailed` if no courier account is active
/// - `AppError::Courier` if Steadfast refuses the return request
#[instrument(skip(state, reason))]
pub async fn cancel(state: &AppState, id: OrderId, reason: Option<String>) -> Result<Order> {
    let repo = OrderRepository::new(state.pool());
    let order = repo.get(id).await?.ok_or_else(order_not_found)?;

    let consignment_id = match order.consignment_id {
        Some(cid) if order.has_active_consignment() => cid,
        _ => {
            return Err(AppError::Conflict(
                "Order has no active courier consignment".to_string(),
            ));
        }
    };
    if !order.status.can_transition_to(OrderStatus::Cancelled) {
        return Err(AppError::Conflict(format!(
            "Cannot cancel a {} order",
            order.status
        )));
    }

    let client = state.active_courier().await?;
    let request = client.create_return_request(consignment_id, reason).await?;

    let updated = repo
        .record_courier_status(
            id,
            CourierDeliveryStatus::Cancelled,
            Some(OrderStatus::Cancelled),
        )
        .await
        .map_err(or_order_not_found)?;

    tracing::info!(
        order_id = %id,
        consignment_id,
        return_request_id = request.id,
        "Courier consignment cancelled"
    );
    Ok(updated)
}

/// Refresh every open dispatched order, a few at a time. One order failing
/// does not stop the rest.
///
/// # Errors
///
/// Returns `AppError::PreconditionFailed` if no courier account is active,
/// or a database error if the orders cannot be listed.
#[instrument(skip(state))]
pub async fn sync_all(state: &AppState) -> Result<SyncReport> {
    let client = state.active_courier().await?;
    let repo = OrderRepository::new(state.pool());
    let orders = repo.list_courier_tracked(SYNC_BATCH).await?;

    let outcomes: Vec<(Order, Result<bool>)> = stream::iter(orders)
        .map(|order| {
            let repo = &repo;
            let client = &client;
            async move {
                let outcome = sync_with(repo, client, &order)
                    .await
                    .map(|(_, changed)| changed);
                (order, outcome)
            }
        })
        .buffer_unordered(SYNC_CONCURRENCY)
        .collect()
        .await;

    let mut report = SyncReport {
        checked: outcomes.len(),
        ..SyncReport::default()
    };
    for (order, outcome) in outcomes {
        match outcome {
            Ok(true) => report.updated += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Courier sync failed for order");
                report.failed.push(SyncFailure {
                    order_id: order.id,
                    order_number: order.order_number,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        checked = report.checked,
        updated = report.updated,
        failed = report.failed.len(),
        "Courier sync finished"
    );
    Ok(report)
}

/// Run [`sync_all`] every `period` until the task is aborted.
pub fn spawn_poller(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately; let the server settle first.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match sync_all(&state).await {
                Ok(_) => {}
                Err(AppError::PreconditionFailed(_)) => {
                    tracing::debug!("No active courier account, skipping courier sync");
                }
                Err(e) => tracing::error!(error = %e, "Background courier sync failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_moves_shipped_order() {
        assert_eq!(
            next_order_status(OrderStatus::Shipped, CourierDeliveryStatus::Delivered),
            Some(OrderStatus::Delivered)
        );
        assert_eq!(
            next_order_status(OrderStatus::Shipped, CourierDeliveryStatus::Cancelled),
            Some(OrderStatus::Cancelled)
        );
    }

    #[test]
    fn test_same_status_is_not_a_change() {
        assert_eq!(
            next_order_status(OrderStatus::Shipped, CourierDeliveryStatus::InReview),
            None
        );
    }

    #[test]
    fn test_approval_pending_leaves_order_alone() {
        assert_eq!(
            next_order_status(
                OrderStatus::Shipped,
                CourierDeliveryStatus::DeliveredApprovalPending
            ),
            None
        );
        assert_eq!(
            next_order_status(OrderStatus::Shipped, CourierDeliveryStatus::Unknown),
            None
        );
    }

    #[test]
    fn test_closed_orders_are_not_reopened() {
        assert_eq!(
            next_order_status(OrderStatus::Delivered, CourierDeliveryStatus::Pending),
            None
        );
        assert_eq!(
            next_order_status(OrderStatus::Cancelled, CourierDeliveryStatus::Delivered),
            None
        );
    }

    #[test]
    fn test_status_lookups_fall_back_in_order() {
        assert_eq!(
            status_lookups(Some(1_424_107), Some("15BAEB8A"), "DK000042"),
            vec![
                StatusLookup::Consignment(1_424_107),
                StatusLookup::TrackingCode("15BAEB8A"),
                StatusLookup::Invoice("DK000042"),
            ]
        );
        assert_eq!(
            status_lookups(Some(7), Some(" "), "DK000043"),
            vec![StatusLookup::Consignment(7), StatusLookup::Invoice("DK000043")]
        );
    }

    #[test]
    fn test_only_unknown_reference_triggers_fallback() {
        let not_found = SteadfastError::Api {
            status: 404,
            message: "Consignment not found".to_string(),
        };
        assert!(not_found.is_not_found());
        assert!(
            !SteadfastError::Api {
                status: 500,
                message: "Server error".to_string(),
            }
            .is_not_found()
        );
        assert!(!SteadfastError::Unauthorized.is_not_found());
    }

    #[test]
    fn test_confirmed_order_becomes_shipped() {
        assert_eq!(
            next_order_status(OrderStatus::Confirmed, CourierDeliveryStatus::Hold),
            Some(OrderStatus::Shipped)
        );
    }
}
