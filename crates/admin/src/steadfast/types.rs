//! Steadfast request and response types.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer};

use dokan_core::CourierDeliveryStatus;
use dokan_shared::models::Order;

use super::SteadfastError;

/// Longest recipient name Steadfast accepts.
const MAX_RECIPIENT_NAME: usize = 100;

/// Longest recipient address Steadfast accepts.
const MAX_RECIPIENT_ADDRESS: usize = 250;

/// Body of `POST /create_order`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub invoice: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    #[serde(serialize_with = "decimal_as_number")]
    pub cod_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CreateOrderRequest {
    /// Build the consignment request for `order`.
    ///
    /// The order number becomes the invoice, and the city is appended to
    /// the street address.
    ///
    /// # Errors
    ///
    /// Returns `SteadfastError::InvalidRequest` if the name or address is
    /// too long for Steadfast.
    pub fn from_order(order: &Order) -> Result<Self, SteadfastError> {
        let recipient_name = order.customer_name.trim().to_string();
        if recipient_name.chars().count() > MAX_RECIPIENT_NAME {
            return Err(SteadfastError::InvalidRequest(format!(
                "Recipient name must be at most {MAX_RECIPIENT_NAME} characters"
            )));
        }

        let address = order.address.trim();
        let city = order.city.trim();
        let recipient_address = if city.is_empty() || address.contains(city) {
            address.to_string()
        } else {
            format!("{address}, {city}")
        };
        if recipient_address.chars().count() > MAX_RECIPIENT_ADDRESS {
            return Err(SteadfastError::InvalidRequest(format!(
                "Recipient address must be at most {MAX_RECIPIENT_ADDRESS} characters"
            )));
        }

        Ok(Self {
            invoice: order.order_number.clone(),
            recipient_name,
            recipient_phone: order.phone.clone(),
            recipient_address,
            cod_amount: order.cod_amount(),
            note: order.note.clone().filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Steadfast wants `cod_amount` as a JSON number.
fn decimal_as_number<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    match value.to_f64() {
        Some(number) => serializer.serialize_f64(number),
        None => Err(serde::ser::Error::custom("cod_amount out of range")),
    }
}

/// Body of `POST /create_return_request`.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnRequestBody {
    pub consignment_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A consignment as Steadfast reports it after creation.
#[derive(Debug, Clone, Deserialize)]
pub struct Consignment {
    pub consignment_id: i64,
    pub invoice: String,
    pub tracking_code: String,
    pub status: String,
}

impl Consignment {
    #[must_use]
    pub fn delivery_status(&self) -> CourierDeliveryStatus {
        CourierDeliveryStatus::parse_lenient(&self.status)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateOrderResponse {
    pub consignment: Consignment,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub delivery_status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BalanceResponse {
    pub current_balance: Decimal,
}

/// A return request filed against a consignment.
#[derive(Debug, Clone, Deserialize)]
pub struct ReturnRequest {
    pub id: i64,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use dokan_core::{DeliveryArea, OrderId, OrderStatus, PaymentMethod};

    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::new(1),
            order_number: "DK000042".to_string(),
            customer_id: None,
            customer_name: "Ayesha Siddiqua".to_string(),
            phone: "01712345678".to_string(),
            email: None,
            address: "House 4, Road 7, Dhanmondi".to_string(),
            city: "Dhaka".to_string(),
            delivery_area: DeliveryArea::InsideDhaka,
            note: Some("Call before delivery".to_string()),
            payment_method: PaymentMethod::CashOnDelivery,
            status: OrderStatus::Confirmed,
            subtotal: Decimal::new(99_000, 2),
            shipping_charge: Decimal::from(60),
            total: Decimal::new(105_000, 2),
            courier_provider: None,
            consignment_id: None,
            tracking_code: None,
            courier_status: None,
            courier_updated_at: None,
            items: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_request_from_order() {
        let request = CreateOrderRequest::from_order(&order()).unwrap();
        assert_eq!(request.invoice, "DK000042");
        assert_eq!(request.recipient_address, "House 4, Road 7, Dhanmondi, Dhaka");
        assert_eq!(request.cod_amount, Decimal::new(105_000, 2));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["cod_amount"], serde_json::json!(1050.0));
        assert_eq!(json["note"], "Call before delivery");
    }

    #[test]
    fn test_prepaid_order_collects_nothing() {
        let mut order = order();
        order.payment_method = PaymentMethod::Bkash;
        order.note = None;
        let request = CreateOrderRequest::from_order(&order).unwrap();
        assert_eq!(request.cod_amount, Decimal::ZERO);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_long_address_rejected() {
        let mut order = order();
        order.address = "x".repeat(260);
        assert!(matches!(
            CreateOrderRequest::from_order(&order),
            Err(SteadfastError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_parse_create_order_response() {
        let body = serde_json::json!({
            "status": 200,
            "message": "Consignment has been created successfully.",
            "consignment": {
                "consignment_id": 1_424_107,
                "invoice": "DK000042",
                "tracking_code": "15BAEB8A",
                "recipient_name": "Ayesha Siddiqua",
                "cod_amount": 1050,
                "status": "in_review",
                "created_at": "2026-10-16T10:00:00.000000Z"
            }
        });
        let response: CreateOrderResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.consignment.consignment_id, 1_424_107);
        assert_eq!(
            response.consignment.delivery_status(),
            CourierDeliveryStatus::InReview
        );
    }
}
