//! Session-held shopping cart.
//!
//! The cart stores only product IDs, quantities and chosen options. Prices
//! are always read from the catalog when the cart is shown or checked out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dokan_core::ProductId;
use dokan_shared::models::NewOrderItem;

/// Largest quantity a single cart line can hold.
pub const CART_MAX_QUANTITY: i32 = 99;

/// Most distinct lines a cart can hold.
const CART_MAX_LINES: usize = 50;

/// Rejected cart changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("quantity must be between 1 and {}", CART_MAX_QUANTITY)]
    InvalidQuantity,

    #[error("cart cannot hold more than {} different products", CART_MAX_LINES)]
    TooManyLines,

    #[error("product is not in the cart")]
    NotInCart,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// The shopping cart, stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Add units of a product. Adding a product already in the cart merges
    /// into its line, capped at [`CART_MAX_QUANTITY`]; the new options win.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the quantity is out of range or the cart is full.
    pub fn add(
        &mut self,
        product_id: ProductId,
        quantity: i32,
        size: Option<String>,
        color: Option<String>,
    ) -> Result<(), CartError> {
        if !(1..=CART_MAX_QUANTITY).contains(&quantity) {
            return Err(CartError::InvalidQuantity);
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = (line.quantity + quantity).min(CART_MAX_QUANTITY);
            if size.is_some() {
                line.size = size;
            }
            if color.is_some() {
                line.color = color;
            }
            return Ok(());
        }

        if self.lines.len() >= CART_MAX_LINES {
            return Err(CartError::TooManyLines);
        }
        self.lines.push(CartLine {
            product_id,
            quantity,
            size,
            color,
        });
        Ok(())
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the quantity is out of range or the product is
    /// not in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i32) -> Result<(), CartError> {
        if quantity == 0 {
            return if self.remove(product_id) {
                Ok(())
            } else {
                Err(CartError::NotInCart)
            };
        }
        if !(1..=CART_MAX_QUANTITY).contains(&quantity) {
            return Err(CartError::InvalidQuantity);
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CartError::NotInCart)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove a product. Returns whether it was in the cart.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|l| l.product_id).collect()
    }

    /// Checkout lines for this cart.
    #[must_use]
    pub fn to_order_items(&self) -> Vec<NewOrderItem> {
        self.lines
            .iter()
            .map(|l| NewOrderItem {
                product_id: l.product_id,
                quantity: l.quantity,
                size: l.size.clone(),
                color: l.color.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pid(n: i32) -> ProductId {
        ProductId::new(n)
    }

    #[test]
    fn test_add_merges_and_caps() {
        let mut cart = Cart::default();
        cart.add(pid(1), 2, Some("M".to_string()), None).unwrap();
        cart.add(pid(1), 3, None, Some("Blue".to_string())).unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.lines[0].size.as_deref(), Some("M"));
        assert_eq!(cart.lines[0].color.as_deref(), Some("Blue"));

        cart.add(pid(1), 99, None, None).unwrap();
        assert_eq!(cart.lines[0].quantity, CART_MAX_QUANTITY);
    }

    #[test]
    fn test_add_rejects_bad_quantity() {
        let mut cart = Cart::default();
        assert_eq!(cart.add(pid(1), 0, None, None), Err(CartError::InvalidQuantity));
        assert_eq!(cart.add(pid(1), 100, None, None), Err(CartError::InvalidQuantity));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_limits_lines() {
        let mut cart = Cart::default();
        for n in 0..50 {
            cart.add(pid(n), 1, None, None).unwrap();
        }
        assert_eq!(cart.add(pid(99), 1, None, None), Err(CartError::TooManyLines));
        // Merging into an existing line still works when full.
        cart.add(pid(3), 1, None, None).unwrap();
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::default();
        cart.add(pid(1), 2, None, None).unwrap();
        cart.add(pid(2), 1, None, None).unwrap();

        cart.set_quantity(pid(1), 7).unwrap();
        assert_eq!(cart.item_count(), 8);

        cart.set_quantity(pid(1), 0).unwrap();
        assert_eq!(cart.product_ids(), vec![pid(2)]);
        assert_eq!(cart.set_quantity(pid(1), 0), Err(CartError::NotInCart));
        assert_eq!(cart.set_quantity(pid(2), -1), Err(CartError::InvalidQuantity));
    }

    #[test]
    fn test_to_order_items() {
        let mut cart = Cart::default();
        cart.add(pid(4), 2, None, Some("Red".to_string())).unwrap();
        let items = cart.to_order_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, pid(4));
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].color.as_deref(), Some("Red"));
    }

    #[test]
    fn test_session_round_trip_shape() {
        let cart: Cart =
            serde_json::from_str(r#"{"lines":[{"product_id":3,"quantity":1}]}"#).unwrap();
        assert_eq!(cart.lines[0].size, None);
    }
}
