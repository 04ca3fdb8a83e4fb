//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /admin/login                          - Email/password sign-in (rate limited)
//! GET    /admin/verify                         - Current admin
//! POST   /admin/logout                         - Clear the token cookie
//! PUT    /admin/password                       - Change own password
//!
//! # Admin accounts (super admin)
//! GET    /api/admin-users
//! POST   /api/admin-users
//! DELETE /api/admin-users/{id}
//!
//! # Catalog (multipart for create/update)
//! GET    /api/categories
//! POST   /api/categories
//! GET    /api/categories/{id}
//! PUT    /api/categories/{id}
//! DELETE /api/categories/{id}
//! GET    /api/products
//! POST   /api/products
//! GET    /api/products/{id}
//! PUT    /api/products/{id}
//! DELETE /api/products/{id}
//! PATCH  /api/products/{id}/stock
//!
//! # Orders
//! GET    /api/dashboard                        - Figures, low stock, recent orders
//! GET    /api/orders
//! GET    /api/orders/{id}
//! PUT    /api/orders/{id}                      - Edit delivery details
//! DELETE /api/orders/{id}
//! PATCH  /api/orders/{id}/status
//! GET    /api/orders/{id}/receipt              - PDF receipt
//! POST   /api/orders/{id}/courier              - Dispatch to Steadfast
//! POST   /api/orders/{id}/courier/sync         - Refresh delivery status
//! POST   /api/orders/{id}/courier/cancel       - Return request and cancel
//! POST   /api/courier/sync                     - Refresh all dispatched orders
//!
//! # Courier accounts (writes need super admin)
//! GET    /api/courier-settings
//! POST   /api/courier-settings
//! GET    /api/courier-settings/{id}
//! PUT    /api/courier-settings/{id}
//! DELETE /api/courier-settings/{id}
//! POST   /api/courier-settings/{id}/activate
//! POST   /api/courier-settings/{id}/deactivate
//! GET    /api/courier-settings/{id}/balance
//!
//! # Content
//! GET    /api/navbar
//! POST   /api/navbar
//! PUT    /api/navbar/order
//! PUT    /api/navbar/{id}
//! DELETE /api/navbar/{id}
//! GET    /api/footer
//! PUT    /api/footer
//! ```

pub mod admin_users;
pub mod auth;
pub mod categories;
pub mod content;
pub mod courier;
pub mod courier_settings;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login).layer(login_rate_limiter()))
        .route("/verify", get(auth::verify))
        .route("/logout", post(auth::logout))
        .route("/password", put(auth::change_password))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/products/{id}/stock", patch(products::update_stock))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(orders::dashboard))
        .route("/orders", get(orders::list))
        .route(
            "/orders/{id}",
            get(orders::show)
                .put(orders::update_details)
                .delete(orders::delete),
        )
        .route("/orders/{id}/status", patch(orders::update_status))
        .route("/orders/{id}/receipt", get(orders::receipt))
        .route("/orders/{id}/courier", post(courier::dispatch))
        .route("/orders/{id}/courier/sync", post(courier::sync))
        .route("/orders/{id}/courier/cancel", post(courier::cancel))
        .route("/courier/sync", post(courier::sync_all))
}

/// Create the settings and content routes router.
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin-users",
            get(admin_users::list).post(admin_users::create),
        )
        .route(
            "/admin-users/{id}",
            axum::routing::delete(admin_users::delete),
        )
        .route(
            "/courier-settings",
            get(courier_settings::list).post(courier_settings::create),
        )
        .route(
            "/courier-settings/{id}",
            get(courier_settings::show)
                .put(courier_settings::update)
                .delete(courier_settings::delete),
        )
        .route(
            "/courier-settings/{id}/activate",
            post(courier_settings::activate),
        )
        .route(
            "/courier-settings/{id}/deactivate",
            post(courier_settings::deactivate),
        )
        .route(
            "/courier-settings/{id}/balance",
            get(courier_settings::balance),
        )
        .route(
            "/navbar",
            get(content::list_navbar).post(content::create_navbar_item),
        )
        .route("/navbar/order", put(content::reorder_navbar))
        .route(
            "/navbar/{id}",
            put(content::update_navbar_item).delete(content::delete_navbar_item),
        )
        .route("/footer", get(content::footer).put(content::update_footer))
}

/// Create all routes for the admin API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/admin", auth_routes())
        .nest(
            "/api",
            catalog_routes()
                .merge(order_routes())
                .merge(settings_routes()),
        )
}
