//! Storefront-only models: session state and response views.

pub mod cart;
pub mod session;
pub mod views;

pub use cart::{CART_MAX_QUANTITY, Cart, CartError, CartLine};
pub use session::{CurrentCustomer, session_keys};
pub use views::{CartAdjustment, CartItemView, CartNotice, CartView, CategoryView, ProductView};
