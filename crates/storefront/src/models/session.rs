//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use dokan_core::{CustomerId, Email};
use dokan_shared::models::Customer;

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCustomer {
    pub id: CustomerId,
    pub email: Email,
    pub name: String,
}

impl From<&Customer> for CurrentCustomer {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email.clone(),
            name: customer.name.clone(),
        }
    }
}

/// Session keys.
pub mod session_keys {
    /// The signed-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Google OAuth state (CSRF protection), consumed by the callback.
    pub const GOOGLE_OAUTH_STATE: &str = "google_oauth_state";

    /// The shopping cart.
    pub const CART: &str = "cart";

    /// Wishlist product IDs for guests, merged on sign-in.
    pub const GUEST_WISHLIST: &str = "guest_wishlist";
}
