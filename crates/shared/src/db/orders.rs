//! Order repository.
//!
//! Checkout happens in a single transaction: the order number counter is
//! bumped, the ordered products are locked, stock is checked and
//! decremented, and the order with its lines is inserted. Any failure rolls
//! the whole thing back, so a failed checkout never consumes stock.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use dokan_core::{
    CourierDeliveryStatus, CourierProvider, CustomerId, LocalizedText, OrderId, OrderItemId,
    OrderStatus, ProductId, effective_price, format_order_number,
};

use super::{RepositoryError, like_pattern, parse_column};
use crate::models::{
    NewOrder, Order, OrderDetailsUpdate, OrderFilter, OrderItem, OrderStats, Page,
    page_offset,
};

/// Counter name used for order numbers.
pub const ORDER_COUNTER: &str = "order";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    customer_id: Option<i32>,
    customer_name: String,
    phone: String,
    email: Option<String>,
    address: String,
    city: String,
    delivery_area: String,
    note: Option<String>,
    payment_method: String,
    status: String,
    subtotal: Decimal,
    shipping_charge: Decimal,
    total: Decimal,
    courier_provider: Option<String>,
    consignment_id: Option<i64>,
    tracking_code: Option<String>,
    courier_status: Option<String>,
    courier_updated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        Ok(Order {
            id: OrderId::new(self.id),
            order_number: self.order_number,
            customer_id: self.customer_id.map(CustomerId::new),
            customer_name: self.customer_name,
            phone: self.phone,
            email: self.email,
            address: self.address,
            city: self.city,
            delivery_area: parse_column(&self.delivery_area, "delivery_area")?,
            note: self.note,
            payment_method: parse_column(&self.payment_method, "payment_method")?,
            status: parse_column(&self.status, "status")?,
            subtotal: self.subtotal,
            shipping_charge: self.shipping_charge,
            total: self.total,
            courier_provider: self
                .courier_provider
                .as_deref()
                .map(|p| parse_column::<CourierProvider>(p, "courier_provider"))
                .transpose()?,
            consignment_id: self.consignment_id,
            tracking_code: self.tracking_code,
            courier_status: self
                .courier_status
                .as_deref()
                .map(|s| parse_column::<CourierDeliveryStatus>(s, "courier_status"))
                .transpose()?,
            courier_updated_at: self.courier_updated_at,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: Option<i32>,
    product_name_en: String,
    product_name_bn: String,
    image_url: Option<String>,
    size: Option<String>,
    color: Option<String>,
    unit_price: Decimal,
    quantity: i32,
    line_total: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            product_id: row.product_id.map(ProductId::new),
            product_name: LocalizedText::new(row.product_name_en, row.product_name_bn),
            image_url: row.image_url,
            size: row.size,
            color: row.color,
            unit_price: row.unit_price,
            quantity: row.quantity,
            line_total: row.line_total,
        }
    }
}

/// Product fields needed to price and reserve a checkout line.
#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    id: i32,
    name_en: String,
    name_bn: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    stock: i32,
    is_active: bool,
    image_url: Option<String>,
}

const ORDER_COLUMNS: &str = "
    id, order_number, customer_id, customer_name, phone, email, address, city,
    delivery_area, note, payment_method, status, subtotal, shipping_charge, total,
    courier_provider, consignment_id, tracking_code, courier_status,
    courier_updated_at, created_at, updated_at";

const ORDER_FILTER_WHERE: &str = "
    WHERE ($1::text IS NULL OR status = $1)
      AND ($2::text IS NULL OR order_number ILIKE $2 OR customer_name ILIKE $2 OR phone ILIKE $2)
      AND ($3::int IS NULL OR customer_id = $3)";

/// Atomically increment a named counter and return its new value.
async fn next_counter_value(conn: &mut PgConnection, name: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO shop.counter (name, value) VALUES ($1, 1)
         ON CONFLICT (name) DO UPDATE SET value = shop.counter.value + 1
         RETURNING value",
    )
    .bind(name)
    .fetch_one(conn)
    .await
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Take the next order sequence number from the `order` counter.
    ///
    /// Runs on the caller's connection so checkout can take the number
    /// inside its transaction; a rolled-back checkout gives the number back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn next_order_sequence(conn: &mut PgConnection) -> Result<i64, RepositoryError> {
        Ok(next_counter_value(conn, ORDER_COUNTER).await?)
    }

    /// Place an order.
    ///
    /// Lines are priced from the catalog at the effective price. Identical
    /// lines are merged, while sizes and colors of one product stay separate
    /// lines and share that product's stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order has no lines, a
    /// product is missing or inactive, or stock is insufficient.
    pub async fn create(
        &self,
        new: &NewOrder,
        number_prefix: &str,
    ) -> Result<Order, RepositoryError> {
        let items = new.merged_items();
        if items.is_empty() {
            return Err(RepositoryError::Conflict("order has no items".to_owned()));
        }
        if let Some(bad) = new.items.iter().find(|i| i.quantity <= 0) {
            return Err(RepositoryError::Conflict(format!(
                "invalid quantity for product {}",
                bad.product_id
            )));
        }
        let demand = new.quantities_by_product();

        let mut tx = self.pool.begin().await?;

        let ids: Vec<i32> = demand.keys().map(|id| id.as_i32()).collect();
        let stock_rows = sqlx::query_as::<_, StockRow>(
            "SELECT id, name_en, name_bn, price, discount_price, stock, is_active,
                    images[1] AS image_url
             FROM shop.product
             WHERE id = ANY($1)
             ORDER BY id
             FOR UPDATE",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;
        let products: HashMap<i32, StockRow> =
            stock_rows.into_iter().map(|row| (row.id, row)).collect();

        for (product_id, quantity) in &demand {
            let product = products
                .get(&product_id.as_i32())
                .filter(|p| p.is_active)
                .ok_or_else(|| {
                    RepositoryError::Conflict(format!("product {product_id} is not available"))
                })?;
            if product.stock < *quantity {
                return Err(RepositoryError::Conflict(format!(
                    "insufficient stock for {} ({} available)",
                    product.name_en, product.stock
                )));
            }
        }

        let mut subtotal = Decimal::ZERO;
        let mut priced = Vec::with_capacity(items.len());
        for item in &items {
            let product = products
                .get(&item.product_id.as_i32())
                .ok_or(RepositoryError::NotFound)?;
            let unit_price = effective_price(product.price, product.discount_price);
            let line_total = unit_price * Decimal::from(item.quantity);
            subtotal += line_total;
            priced.push((item, product, unit_price, line_total));
        }
        let total = subtotal + new.shipping_charge;

        let sequence = Self::next_order_sequence(&mut *tx).await?;
        let order_number = format_order_number(number_prefix, sequence);

        let order_id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.orders
                (order_number, customer_id, customer_name, phone, email, address, city,
                 delivery_area, note, payment_method, status, subtotal, shipping_charge, total)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING id",
        )
        .bind(&order_number)
        .bind(new.customer_id)
        .bind(new.customer_name.trim())
        .bind(new.phone.as_str())
        .bind(new.email.as_deref())
        .bind(new.address.trim())
        .bind(new.city.trim())
        .bind(new.delivery_area.as_str())
        .bind(new.note.as_deref())
        .bind(new.payment_method.as_str())
        .bind(OrderStatus::Pending.as_str())
        .bind(subtotal)
        .bind(new.shipping_charge)
        .bind(total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "order number already used"))?;

        for (item, product, unit_price, line_total) in priced {
            sqlx::query(
                "INSERT INTO shop.order_item
                    (order_id, product_id, product_name_en, product_name_bn, image_url,
                     size, color, unit_price, quantity, line_total)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(&product.name_en)
            .bind(&product.name_bn)
            .bind(product.image_url.as_deref())
            .bind(item.size.as_deref())
            .bind(item.color.as_deref())
            .bind(unit_price)
            .bind(item.quantity)
            .bind(line_total)
            .execute(&mut *tx)
            .await?;
        }

        for (product_id, quantity) in &demand {
            let reserved = sqlx::query(
                "UPDATE shop.product SET stock = stock - $2, updated_at = now()
                 WHERE id = $1 AND stock >= $2",
            )
            .bind(*product_id)
            .bind(*quantity)
            .execute(&mut *tx)
            .await?;
            if reserved.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "insufficient stock for product {product_id}"
                )));
            }
        }

        tx.commit().await?;

        tracing::info!(order_number = %order_number, %total, "order placed");

        self.get(OrderId::new(order_id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if stored enums are invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Get an order by its public number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if stored enums are invalid.
    pub async fn get_by_number(&self, number: &str) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE order_number = $1"
        ))
        .bind(number.trim().to_ascii_uppercase())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Page<Order>, RepositoryError> {
        let search = filter
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(like_pattern);
        let status = filter.status.map(OrderStatus::as_str);
        let offset = page_offset(filter.page, filter.per_page);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM shop.orders {ORDER_FILTER_WHERE}"
        ))
        .bind(status)
        .bind(search.as_deref())
        .bind(filter.customer_id)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders {ORDER_FILTER_WHERE}
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        ))
        .bind(status)
        .bind(search.as_deref())
        .bind(filter.customer_id)
        .bind(filter.per_page)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let orders = self.attach_items(rows).await?;
        Ok(Page::new(orders, total, filter.page, filter.per_page))
    }

    /// Set an order's status. Transition rules are the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.orders SET status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(self.pool)
        .await?;

        self.reload(id, updated.rows_affected()).await
    }

    /// Edit delivery details. The total is recomputed from the new shipping
    /// charge.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_details(
        &self,
        id: OrderId,
        details: &OrderDetailsUpdate,
    ) -> Result<Order, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.orders
             SET customer_name = $2, phone = $3, address = $4, city = $5,
                 delivery_area = $6, note = $7, shipping_charge = $8,
                 total = subtotal + $8, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(details.customer_name.trim())
        .bind(details.phone.as_str())
        .bind(details.address.trim())
        .bind(details.city.trim())
        .bind(details.delivery_area.as_str())
        .bind(details.note.as_deref())
        .bind(details.shipping_charge)
        .execute(self.pool)
        .await?;

        self.reload(id, updated.rows_affected()).await
    }

    /// Delete an order and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM shop.orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store a freshly created consignment and move the order to `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn record_consignment(
        &self,
        id: OrderId,
        provider: CourierProvider,
        consignment_id: i64,
        tracking_code: &str,
        courier_status: CourierDeliveryStatus,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.orders
             SET courier_provider = $2, consignment_id = $3, tracking_code = $4,
                 courier_status = $5, courier_updated_at = now(), status = $6,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(provider.as_str())
        .bind(consignment_id)
        .bind(tracking_code)
        .bind(courier_status.as_str())
        .bind(status.as_str())
        .execute(self.pool)
        .await?;

        self.reload(id, updated.rows_affected()).await
    }

    /// Store the latest courier status, and the order status it implies when
    /// there is one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn record_courier_status(
        &self,
        id: OrderId,
        courier_status: CourierDeliveryStatus,
        status: Option<OrderStatus>,
    ) -> Result<Order, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.orders
             SET courier_status = $2, courier_updated_at = now(),
                 status = COALESCE($3, status), updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(courier_status.as_str())
        .bind(status.map(OrderStatus::as_str))
        .execute(self.pool)
        .await?;

        self.reload(id, updated.rows_affected()).await
    }

    /// Open orders with a live consignment, oldest update first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_courier_tracked(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders
             WHERE consignment_id IS NOT NULL
               AND status NOT IN ('delivered', 'cancelled', 'returned')
               AND courier_status IS DISTINCT FROM 'cancelled'
             ORDER BY courier_updated_at ASC NULLS FIRST, id
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Dashboard numbers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn stats(&self, low_stock_threshold: i32) -> Result<OrderStats, RepositoryError> {
        let by_status: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM shop.orders GROUP BY status")
                .fetch_all(self.pool)
                .await?;

        let delivered_revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total), 0) FROM shop.orders WHERE status = 'delivered'",
        )
        .fetch_one(self.pool)
        .await?;

        let (total_products, low_stock_products): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active AND stock <= $1)
             FROM shop.product",
        )
        .bind(low_stock_threshold)
        .fetch_one(self.pool)
        .await?;

        let total_customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.customer")
            .fetch_one(self.pool)
            .await?;

        let mut counts: BTreeMap<String, i64> = OrderStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_owned(), 0))
            .collect();
        for (status, count) in by_status {
            counts.insert(status, count);
        }

        Ok(OrderStats {
            total_orders: counts.values().sum(),
            by_status: counts,
            delivered_revenue,
            total_products,
            low_stock_products,
            total_customers,
        })
    }

    async fn reload(&self, id: OrderId, rows_affected: u64) -> Result<Order, RepositoryError> {
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Load the lines for `rows` in one query and assemble domain orders.
    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_id, product_id, product_name_en, product_name_bn, image_url,
                    size, color, unit_price, quantity, line_total
             FROM shop.order_item
             WHERE order_id = ANY($1)
             ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            by_order.entry(row.order_id).or_default().push(row.into());
        }

        rows.into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(status: &str, courier_status: Option<&str>) -> OrderRow {
        OrderRow {
            id: 1,
            order_number: "DK000001".to_string(),
            customer_id: None,
            customer_name: "Rahim".to_string(),
            phone: "01712345678".to_string(),
            email: None,
            address: "Mirpur 10".to_string(),
            city: "Dhaka".to_string(),
            delivery_area: "inside_dhaka".to_string(),
            note: None,
            payment_method: "cash_on_delivery".to_string(),
            status: status.to_string(),
            subtotal: Decimal::from(500),
            shipping_charge: Decimal::from(60),
            total: Decimal::from(560),
            courier_provider: courier_status.map(|_| "steadfast".to_string()),
            consignment_id: courier_status.map(|_| 1_424_107),
            tracking_code: courier_status.map(|_| "15BAEB8A".to_string()),
            courier_status: courier_status.map(str::to_string),
            courier_updated_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_into_order_parses_enums() {
        let order = row("shipped", Some("in_review")).into_order(vec![]).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.courier_status, Some(CourierDeliveryStatus::InReview));
        assert_eq!(order.courier_provider, Some(CourierProvider::Steadfast));
        assert!(order.has_active_consignment());
        assert_eq!(order.cod_amount(), Decimal::from(560));
    }

    #[test]
    fn test_row_with_unknown_status_is_corruption() {
        let err = row("lost", None).into_order(vec![]).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
