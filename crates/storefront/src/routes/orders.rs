//! Checkout and order lookup.
//!
//! Guests can place orders and look them up by number plus the phone number
//! used at checkout. Signed-in customers also see their order history.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use dokan_core::{DeliveryArea, Email, PaymentMethod, PhoneNumber, ProductId};
use dokan_shared::db::OrderRepository;
use dokan_shared::models::{NewOrder, NewOrderItem, Order, OrderFilter, Page, clamp_paging};
use dokan_shared::receipt::content_disposition;

use crate::error::{AppError, Result};
use crate::middleware::{OptionalCustomer, RequireCustomer};
use crate::models::{CART_MAX_QUANTITY, Cart, CurrentCustomer};
use crate::routes::cart::{load_cart, save_cart};
use crate::state::AppState;

const MAX_NAME_CHARS: usize = 100;
const MAX_ADDRESS_CHARS: usize = 500;
const MAX_CITY_CHARS: usize = 100;
const MAX_NOTE_CHARS: usize = 1000;
/// Most lines accepted in an explicit `items` list.
const MAX_ITEMS: usize = 50;

/// One line in an explicit checkout item list.
#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: i32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// `POST /api/orders` body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    pub delivery_area: DeliveryArea,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Order these lines instead of the session cart.
    #[serde(default)]
    pub items: Option<Vec<CheckoutItem>>,
}

fn required(value: &str, field: &str, max_chars: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if value.chars().count() > max_chars {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(value.to_string())
}

impl CheckoutRequest {
    /// Validate the delivery details and resolve the lines to order.
    fn into_new_order(
        self,
        customer: Option<&CurrentCustomer>,
        cart: &Cart,
        shipping_charge: impl FnOnce(DeliveryArea) -> rust_decimal::Decimal,
    ) -> Result<NewOrder> {
        let customer_name = required(&self.customer_name, "Name", MAX_NAME_CHARS)?;
        let phone = PhoneNumber::parse(&self.phone)
            .map_err(|e| AppError::BadRequest(format!("Invalid phone number: {e}")))?;
        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .map(|e| Email::parse(&e))
            .transpose()
            .map_err(|e| AppError::BadRequest(format!("Invalid email: {e}")))?
            .map(Email::into_inner)
            .or_else(|| customer.map(|c| c.email.as_str().to_string()));
        let address = required(&self.address, "Address", MAX_ADDRESS_CHARS)?;
        let city = required(&self.city, "City", MAX_CITY_CHARS)?;
        let note = self
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if note.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTE_CHARS) {
            return Err(AppError::BadRequest(format!(
                "Note must be at most {MAX_NOTE_CHARS} characters"
            )));
        }

        let items = match self.items {
            Some(items) => {
                if items.len() > MAX_ITEMS {
                    return Err(AppError::BadRequest(format!(
                        "An order can have at most {MAX_ITEMS} lines"
                    )));
                }
                items
                    .into_iter()
                    .map(|i| {
                        if (1..=CART_MAX_QUANTITY).contains(&i.quantity) {
                            Ok(NewOrderItem {
                                product_id: i.product_id,
                                quantity: i.quantity,
                                size: i.size,
                                color: i.color,
                            })
                        } else {
                            Err(AppError::BadRequest(format!(
                                "Quantity must be between 1 and {CART_MAX_QUANTITY}"
                            )))
                        }
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            None => cart.to_order_items(),
        };
        if items.is_empty() {
            return Err(AppError::BadRequest("Your cart is empty".to_string()));
        }

        Ok(NewOrder {
            customer_id: customer.map(|c| c.id),
            customer_name,
            phone,
            email,
            address,
            city,
            shipping_charge: shipping_charge(self.delivery_area),
            delivery_area: self.delivery_area,
            note,
            payment_method: self.payment_method,
            items,
        })
    }
}

/// Place an order.
///
/// Prices come from the catalog and stock is reserved in the same
/// transaction. The session cart is cleared when it was used.
///
/// # Route
///
/// `POST /api/orders`
#[instrument(skip(state, session, customer, body))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let from_cart = body.items.is_none();
    let cart = load_cart(&session).await?;
    let shipping = &state.config().shipping;
    let new_order = body.into_new_order(customer.as_ref(), &cart, |area| shipping.charge(area))?;

    let order = OrderRepository::new(state.pool())
        .create(&new_order, &state.config().order_number_prefix)
        .await?;

    if from_cart {
        save_cart(&session, &Cart::default()).await?;
    }

    tracing::info!(
        order_number = %order.order_number,
        customer_id = ?order.customer_id,
        total = %order.total,
        "Checkout completed"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

/// Paging for `GET /api/orders`.
#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// The signed-in customer's orders, newest first.
///
/// # Route
///
/// `GET /api/orders`
#[instrument(skip(state, customer))]
pub async fn list(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Page<Order>>> {
    let (page, per_page) = clamp_paging(query.page, query.per_page);
    let filter = OrderFilter {
        customer_id: Some(customer.id),
        page,
        per_page,
        ..OrderFilter::default()
    };
    Ok(Json(OrderRepository::new(state.pool()).list(&filter).await?))
}

/// One of the signed-in customer's orders.
///
/// Orders belonging to someone else are reported as missing.
///
/// # Route
///
/// `GET /api/orders/{number}`
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    Path(number): Path<String>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get_by_number(&number)
        .await?
        .filter(|o| o.customer_id == Some(customer.id))
        .map(Json)
        .ok_or_else(order_not_found)
}

/// Query for `GET /api/orders/track`.
#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub number: String,
    pub phone: String,
}

/// Look up an order by number and checkout phone.
///
/// # Route
///
/// `GET /api/orders/track`
#[instrument(skip(state, query), fields(order_number = %query.number))]
pub async fn track(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<Order>> {
    let phone = PhoneNumber::parse(&query.phone)
        .map_err(|e| AppError::BadRequest(format!("Invalid phone number: {e}")))?;

    OrderRepository::new(state.pool())
        .get_by_number(&query.number)
        .await?
        .filter(|o| o.phone == phone.as_str())
        .map(Json)
        .ok_or_else(order_not_found)
}

/// Query for the receipt download.
#[derive(Debug, Deserialize)]
pub struct ReceiptQuery {
    pub phone: Option<String>,
}

/// Whether the caller may see `order`: its owner, or anyone who knows the
/// phone number it was placed with.
fn may_view(order: &Order, customer: Option<&CurrentCustomer>, phone: Option<&str>) -> bool {
    if customer.is_some_and(|c| order.customer_id == Some(c.id)) {
        return true;
    }
    phone
        .and_then(|p| PhoneNumber::parse(p).ok())
        .is_some_and(|p| p.as_str() == order.phone)
}

/// Download an order's PDF receipt.
///
/// # Route
///
/// `GET /api/orders/{number}/receipt`
#[instrument(skip(state, customer, query))]
pub async fn receipt(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Path(number): Path<String>,
    Query(query): Query<ReceiptQuery>,
) -> Result<Response> {
    let order = OrderRepository::new(state.pool())
        .get_by_number(&number)
        .await?
        .filter(|o| may_view(o, customer.as_ref(), query.phone.as_deref()))
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

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use dokan_core::{CustomerId, OrderId, OrderStatus};

    use super::*;

    fn request(items: Option<Vec<CheckoutItem>>) -> CheckoutRequest {
        CheckoutRequest {
            customer_name: " Rahim Uddin ".to_string(),
            phone: "+8801812345678".to_string(),
            email: Some(String::new()),
            address: "12/A Mirpur Road".to_string(),
            city: "Dhaka".to_string(),
            delivery_area: DeliveryArea::OutsideDhaka,
            note: Some("  ".to_string()),
            payment_method: PaymentMethod::default(),
            items,
        }
    }

    fn rates(area: DeliveryArea) -> Decimal {
        match area {
            DeliveryArea::InsideDhaka => Decimal::from(60),
            DeliveryArea::OutsideDhaka => Decimal::from(120),
        }
    }

    fn order(customer_id: Option<CustomerId>, phone: &str) -> Order {
        Order {
            id: OrderId::new(1),
            order_number: "DK000001".to_string(),
            customer_id,
            customer_name: "Rahim".to_string(),
            phone: phone.to_string(),
            email: None,
            address: "12/A Mirpur Road".to_string(),
            city: "Dhaka".to_string(),
            delivery_area: DeliveryArea::InsideDhaka,
            note: None,
            payment_method: PaymentMethod::CashOnDelivery,
            status: OrderStatus::Pending,
            subtotal: Decimal::from(500),
            shipping_charge: Decimal::from(60),
            total: Decimal::from(560),
            courier_provider: None,
            consignment_id: None,
            tracking_code: None,
            courier_status: None,
            courier_updated_at: None,
            items: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_checkout_uses_cart_and_shipping_rate() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(3), 2, Some("M".to_string()), None)
            .unwrap();

        let new = request(None).into_new_order(None, &cart, rates).unwrap();
        assert_eq!(new.customer_name, "Rahim Uddin");
        assert_eq!(new.phone.as_str(), "01812345678");
        assert_eq!(new.email, None);
        assert_eq!(new.note, None);
        assert_eq!(new.shipping_charge, Decimal::from(120));
        assert_eq!(new.items.len(), 1);
        assert_eq!(new.items[0].quantity, 2);
    }

    #[test]
    fn test_checkout_explicit_items_override_cart() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(3), 2, None, None).unwrap();
        let items = vec![CheckoutItem {
            product_id: ProductId::new(9),
            quantity: 1,
            size: None,
            color: Some("Blue".to_string()),
        }];

        let new = request(Some(items))
            .into_new_order(None, &cart, rates)
            .unwrap();
        assert_eq!(new.items.len(), 1);
        assert_eq!(new.items[0].product_id, ProductId::new(9));
    }

    #[test]
    fn test_checkout_rejects_bad_input() {
        let empty = Cart::default();
        assert!(matches!(
            request(None).into_new_order(None, &empty, rates),
            Err(AppError::BadRequest(msg)) if msg == "Your cart is empty"
        ));

        let mut bad_phone = request(Some(vec![]));
        bad_phone.phone = "123".to_string();
        assert!(bad_phone.into_new_order(None, &empty, rates).is_err());

        let zero = vec![CheckoutItem {
            product_id: ProductId::new(1),
            quantity: 0,
            size: None,
            color: None,
        }];
        assert!(request(Some(zero)).into_new_order(None, &empty, rates).is_err());

        let mut blank_city = request(None);
        blank_city.city = " ".to_string();
        assert!(blank_city.into_new_order(None, &empty, rates).is_err());
    }

    #[test]
    fn test_may_view_owner_or_phone() {
        let owner = CustomerId::new(5);
        let placed = order(Some(owner), "01812345678");
        let current = CurrentCustomer {
            id: owner,
            email: Email::parse("rahim@example.com").unwrap(),
            name: "Rahim".to_string(),
        };
        let stranger = CurrentCustomer {
            id: CustomerId::new(6),
            ..current.clone()
        };

        assert!(may_view(&placed, Some(&current), None));
        assert!(!may_view(&placed, Some(&stranger), None));
        assert!(may_view(&placed, None, Some("+880 1812-345678")));
        assert!(!may_view(&placed, None, Some("01912345678")));
        assert!(!may_view(&placed, None, Some("garbage")));
    }
}
