//! Orders and their line items.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use dokan_core::{
    CourierDeliveryStatus, CourierProvider, CustomerId, DeliveryArea, LocalizedText, OrderId,
    OrderItemId, OrderStatus, PaymentMethod, PhoneNumber, ProductId,
};

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    pub delivery_area: DeliveryArea,
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub shipping_charge: Decimal,
    pub total: Decimal,
    pub courier_provider: Option<CourierProvider>,
    pub consignment_id: Option<i64>,
    pub tracking_code: Option<String>,
    pub courier_status: Option<CourierDeliveryStatus>,
    pub courier_updated_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether the order has been handed to a courier and not cancelled there.
    #[must_use]
    pub fn has_active_consignment(&self) -> bool {
        self.consignment_id.is_some()
            && self.courier_status != Some(CourierDeliveryStatus::Cancelled)
    }

    /// Amount the courier should collect on delivery.
    #[must_use]
    pub fn cod_amount(&self) -> Decimal {
        match self.payment_method {
            PaymentMethod::CashOnDelivery => self.total,
            PaymentMethod::Bkash | PaymentMethod::Nagad => Decimal::ZERO,
        }
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }
}

/// One order line, snapshotting the product as it was sold.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub product_name: LocalizedText,
    pub image_url: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// A requested line at checkout. Prices come from the catalog, not the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Checkout input for [`crate::db::OrderRepository::create`].
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub phone: PhoneNumber,
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    pub delivery_area: DeliveryArea,
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
    pub shipping_charge: Decimal,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Merge lines that name the same product, size and color. Lines that
    /// differ in size or color stay separate.
    #[must_use]
    pub fn merged_items(&self) -> Vec<NewOrderItem> {
        let mut merged: BTreeMap<(ProductId, Option<&str>, Option<&str>), NewOrderItem> =
            BTreeMap::new();
        for item in &self.items {
            merged
                .entry((item.product_id, item.size.as_deref(), item.color.as_deref()))
                .and_modify(|existing| existing.quantity = existing.quantity.saturating_add(item.quantity))
                .or_insert_with(|| item.clone());
        }
        merged.into_values().collect()
    }

    /// Total quantity requested per product across all variants, which is
    /// what stock is checked and decremented against.
    #[must_use]
    pub fn quantities_by_product(&self) -> BTreeMap<ProductId, i32> {
        let mut totals = BTreeMap::new();
        for item in &self.items {
            let total = totals.entry(item.product_id).or_insert(0_i32);
            *total = total.saturating_add(item.quantity);
        }
        totals
    }
}

/// Staff edits to an order's delivery details.
#[derive(Debug, Clone)]
pub struct OrderDetailsUpdate {
    pub customer_name: String,
    pub phone: PhoneNumber,
    pub address: String,
    pub city: String,
    pub delivery_area: DeliveryArea,
    pub note: Option<String>,
    pub shipping_charge: Decimal,
}

/// Order list filter. Paging values are expected to be clamped already.
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches order number, customer name or phone.
    pub search: Option<String>,
    pub customer_id: Option<CustomerId>,
    pub page: i64,
    pub per_page: i64,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            customer_id: None,
            page: 1,
            per_page: super::DEFAULT_PER_PAGE,
        }
    }
}

/// Dashboard figures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderStats {
    pub total_orders: i64,
    pub by_status: BTreeMap<String, i64>,
    /// Sum of totals over delivered orders.
    pub delivered_revenue: Decimal,
    pub total_products: i64,
    pub low_stock_products: i64,
    pub total_customers: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, quantity: i32, size: Option<&str>) -> NewOrderItem {
        NewOrderItem {
            product_id: ProductId::new(id),
            quantity,
            size: size.map(str::to_string),
            color: None,
        }
    }

    fn order(items: Vec<NewOrderItem>) -> NewOrder {
        NewOrder {
            customer_id: None,
            customer_name: "Ayesha".to_string(),
            phone: PhoneNumber::parse("01712345678").unwrap(),
            email: None,
            address: "House 4, Road 7, Dhanmondi".to_string(),
            city: "Dhaka".to_string(),
            delivery_area: DeliveryArea::InsideDhaka,
            note: None,
            payment_method: PaymentMethod::CashOnDelivery,
            shipping_charge: Decimal::from(60),
            items,
        }
    }

    #[test]
    fn test_merged_items_sums_quantities() {
        let order = order(vec![item(2, 1, Some("M")), item(1, 2, None), item(2, 3, Some("M"))]);

        let merged = order.merged_items();
        assert_eq!(merged, vec![item(1, 2, None), item(2, 4, Some("M"))]);
    }

    #[test]
    fn test_merged_items_keeps_each_size() {
        let order = order(vec![item(7, 1, Some("M")), item(7, 1, Some("L"))]);

        let merged = order.merged_items();
        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&item(7, 1, Some("M"))));
        assert!(merged.contains(&item(7, 1, Some("L"))));
    }

    #[test]
    fn test_quantities_by_product_spans_variants() {
        let order = order(vec![
            item(7, 1, Some("M")),
            item(7, 2, Some("L")),
            item(3, 1, None),
        ]);

        let totals = order.quantities_by_product();
        assert_eq!(totals.get(&ProductId::new(7)), Some(&3));
        assert_eq!(totals.get(&ProductId::new(3)), Some(&1));
        assert_eq!(totals.len(), 2);
    }
}
