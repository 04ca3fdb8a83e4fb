//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET    /api/categories                - All categories
//! GET    /api/categories/{slug}         - One category
//! GET    /api/products                  - Product listing (filters, sort, paging)
//! GET    /api/products/{id}             - Product detail
//! GET    /api/products/{id}/related     - Same-category products
//!
//! # Content
//! GET    /api/navbar                    - Active navbar items
//! GET    /api/footer                    - Footer content
//!
//! # Cart (session)
//! GET    /api/cart                      - Priced cart
//! DELETE /api/cart                      - Empty the cart
//! POST   /api/cart/items                - Add a product
//! PATCH  /api/cart/items/{product_id}   - Change quantity
//! DELETE /api/cart/items/{product_id}   - Remove a line
//!
//! # Wishlist
//! GET    /api/wishlist                  - Wishlist products
//! POST   /api/wishlist/{product_id}     - Add
//! DELETE /api/wishlist/{product_id}     - Remove
//!
//! # Orders
//! POST   /api/orders                    - Checkout (rate limited)
//! GET    /api/orders                    - Signed-in customer's orders
//! GET    /api/orders/track              - Guest lookup by number and phone
//! GET    /api/orders/{number}           - Order detail (owner)
//! GET    /api/orders/{number}/receipt   - PDF receipt
//!
//! # Profile (requires sign-in)
//! GET    /api/profile
//! PUT    /api/profile
//!
//! # Auth
//! GET    /auth/google                   - Redirect to Google (rate limited)
//! GET    /auth/google/callback          - OAuth callback (rate limited)
//! GET    /auth/me                       - Signed-in customer
//! POST   /auth/logout                   - Sign out
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod content;
pub mod orders;
pub mod profile;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let google = Router::new()
        .route("/google", get(auth::google_login))
        .route("/google/callback", get(auth::google_callback))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(google)
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::list_categories))
        .route("/categories/{slug}", get(catalog::show_category))
        .route("/products", get(catalog::list_products))
        .route("/products/{id}", get(catalog::show_product))
        .route("/products/{id}/related", get(catalog::related_products))
        .route("/navbar", get(content::navbar))
        .route("/footer", get(content::footer))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{product_id}",
            axum::routing::patch(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route(
            "/{product_id}",
            post(wishlist::add).delete(wishlist::remove),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(orders::checkout)
                .layer(checkout_rate_limiter())
                .get(orders::list),
        )
        .route("/track", get(orders::track))
        .route("/{number}", get(orders::show))
        .route("/{number}/receipt", get(orders::receipt))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api", catalog_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/wishlist", wishlist_routes())
        .nest("/api/orders", order_routes())
        .route("/api/profile", get(profile::show).put(profile::update))
        .nest("/auth", auth_routes())
}
