//! Integration tests for Dokan.
//!
//! The tests talk to running servers over HTTP and are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! dokan-cli migrate && dokan-cli seed
//! cargo run -p dokan-storefront &
//! cargo run -p dokan-admin &
//!
//! DOKAN_TEST_ADMIN_EMAIL=owner@dokan.com.bd DOKAN_TEST_ADMIN_PASSWORD=... \
//!     cargo test -p dokan-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_URL` - default `http://localhost:3000`
//! - `ADMIN_URL` - default `http://localhost:3001`
//! - `DOKAN_TEST_ADMIN_EMAIL`, `DOKAN_TEST_ADMIN_PASSWORD` - a super admin

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Base URL of the storefront API.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL of the admin API.
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A client that keeps cookies, so session carts and admin tokens persist
/// across requests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn cookie_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Admin credentials from the environment.
///
/// # Panics
///
/// Panics if either variable is unset.
#[must_use]
pub fn admin_credentials() -> (String, String) {
    (
        std::env::var("DOKAN_TEST_ADMIN_EMAIL").expect("DOKAN_TEST_ADMIN_EMAIL not set"),
        std::env::var("DOKAN_TEST_ADMIN_PASSWORD").expect("DOKAN_TEST_ADMIN_PASSWORD not set"),
    )
}

/// Sign in to the admin API and return a client holding the token cookie.
///
/// # Panics
///
/// Panics if the login request fails or is rejected.
pub async fn admin_client() -> Client {
    let client = cookie_client();
    let (email, password) = admin_credentials();

    let resp = client
        .post(format!("{}/admin/login", admin_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK, "admin login rejected");

    client
}

/// A unique suffix for names and slugs created by a test.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// Read a JSON body, panicking with the status on failure.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn json_body(resp: reqwest::Response) -> Value {
    let status = resp.status();
    resp.json()
        .await
        .unwrap_or_else(|e| panic!("expected JSON body (status {status}): {e}"))
}
