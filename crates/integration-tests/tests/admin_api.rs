//! Admin API tests.
//!
//! Require a migrated database, a running admin server
//! (`cargo run -p dokan-admin`) and super admin credentials in
//! `DOKAN_TEST_ADMIN_EMAIL` / `DOKAN_TEST_ADMIN_PASSWORD`.

#![allow(clippy::unwrap_used)]

use dokan_core::OrderStatus;
use dokan_integration_tests::{
    admin_client, admin_credentials, admin_url, cookie_client, json_body, storefront_url, unique,
};
use reqwest::StatusCode;
use reqwest::multipart::Form;
use serde_json::{Value, json};

/// Smallest valid PNG (1x1 transparent pixel).
const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn png_part() -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(PIXEL_PNG)
        .file_name("pixel.png")
        .mime_str("image/png")
        .unwrap()
}

async fn create_category(client: &reqwest::Client) -> Value {
    let name = unique("Test Category");
    let resp = client
        .post(format!("{}/api/categories", admin_url()))
        .multipart(
            Form::new()
                .text("name_en", name)
                .text("name_bn", "পরীক্ষা")
                .part("image", png_part()),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await
}

async fn create_product(client: &reqwest::Client, category_id: i64, stock: i32) -> Value {
    let resp = client
        .post(format!("{}/api/products", admin_url()))
        .multipart(
            Form::new()
                .text("name_en", unique("Test Product"))
                .text("name_bn", "পরীক্ষা পণ্য")
                .text("price", "1200")
                .text("discount_price", "999.50")
                .text("stock", stock.to_string())
                .text("category_id", category_id.to_string())
                .text("sizes", r#"["M","L"]"#)
                .text("colors", "Red, Blue")
                .part("images", png_part()),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await
}

async fn place_order(product_id: i64) -> Value {
    let resp = cookie_client()
        .post(format!("{}/api/orders", storefront_url()))
        .json(&json!({
            "customer_name": "Admin Test",
            "phone": "01712345678",
            "address": "House 9, Road 3, Uttara",
            "city": "Dhaka",
            "delivery_area": "inside_dhaka",
            "payment_method": "cash_on_delivery",
            "items": [{ "product_id": product_id, "quantity": 1, "size": "M" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_health() {
    let resp = reqwest::get(format!("{}/health", admin_url()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let ready = reqwest::get(format!("{}/health/ready", admin_url()))
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_api_requires_token() {
    let resp = reqwest::get(format!("{}/api/orders", admin_url()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = reqwest::Client::new()
        .get(format!("{}/api/orders", admin_url()))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_login_verify_logout() {
    let (email, password) = admin_credentials();
    let client = cookie_client();
    let base = admin_url();

    let bad = client
        .post(format!("{base}/admin/login"))
        .json(&json!({ "email": email, "password": format!("{password}-wrong") }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(bad).await["message"], "Invalid credentials");

    let login = client
        .post(format!("{base}/admin/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    assert!(login.headers().contains_key("set-cookie"));
    let body = json_body(login).await;
    let token = body["token"].as_str().unwrap().to_string();

    // Cookie and bearer token both authenticate.
    let verify = client
        .get(format!("{base}/admin/verify"))
        .send()
        .await
        .unwrap();
    assert_eq!(verify.status(), StatusCode::OK);
    assert_eq!(json_body(verify).await["admin"]["email"], email.to_lowercase());

    let bearer = reqwest::Client::new()
        .get(format!("{base}/admin/verify"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(bearer.status(), StatusCode::OK);

    let logout = client
        .post(format!("{base}/admin/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let after = client
        .get(format!("{base}/admin/verify"))
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_category_crud_with_image() {
    let client = admin_client().await;
    let base = admin_url();

    let category = create_category(&client).await;
    let id = category["id"].as_i64().unwrap();
    assert!(category["image_url"].is_string());
    let slug = category["slug"].as_str().unwrap().to_string();

    // Duplicate slug is a conflict.
    let dup = client
        .post(format!("{base}/api/categories"))
        .multipart(Form::new().text("name_en", "Anything").text("slug", slug))
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status(), StatusCode::CONFLICT);

    let updated = client
        .put(format!("{base}/api/categories/{id}"))
        .multipart(
            Form::new()
                .text("name_en", unique("Renamed"))
                .text("remove_image", "true"),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);
    assert!(json_body(updated).await["image_url"].is_null());

    let deleted = client
        .delete(format!("{base}/api/categories/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = client
        .get(format!("{base}/api/categories/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_rejects_svg_upload() {
    let client = admin_client().await;
    let svg = reqwest::multipart::Part::bytes(b"<svg/>".to_vec())
        .file_name("x.svg")
        .mime_str("image/svg+xml")
        .unwrap();

    let resp = client
        .post(format!("{}/api/categories", admin_url()))
        .multipart(Form::new().text("name_en", unique("Svg")).part("image", svg))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_product_create_stock_and_delete() {
    let client = admin_client().await;
    let base = admin_url();
    let category = create_category(&client).await;

    let product = create_product(&client, category["id"].as_i64().unwrap(), 5).await;
    let id = product["id"].as_i64().unwrap();
    assert_eq!(product["sizes"], json!(["M", "L"]));
    assert_eq!(product["colors"], json!(["Red", "Blue"]));
    assert_eq!(product["price"], "1200.00");
    assert_eq!(product["images"].as_array().unwrap().len(), 1);
    assert_eq!(product["discount_percentage"], 17);

    let negative = client
        .patch(format!("{base}/api/products/{id}/stock"))
        .json(&json!({ "stock": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    let restocked = client
        .patch(format!("{base}/api/products/{id}/stock"))
        .json(&json!({ "stock": 40 }))
        .send()
        .await
        .unwrap();
    assert_eq!(json_body(restocked).await["stock"], 40);

    let bad_discount = client
        .put(format!("{base}/api/products/{id}"))
        .multipart(
            Form::new()
                .text("name_en", "Broken")
                .text("price", "100")
                .text("discount_price", "150"),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(bad_discount.status(), StatusCode::BAD_REQUEST);

    let deleted = client
        .delete(format!("{base}/api/products/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running admin and storefront servers and admin credentials"]
async fn test_order_status_flow() {
    let client = admin_client().await;
    let base = admin_url();
    let category = create_category(&client).await;
    let product = create_product(&client, category["id"].as_i64().unwrap(), 3).await;
    let product_id = product["id"].as_i64().unwrap();

    let order = place_order(product_id).await;
    let id = order["id"].as_i64().unwrap();

    // Checkout reserved one unit.
    let product = json_body(
        client
            .get(format!("{base}/api/products/{product_id}"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(product["stock"], 2);

    let confirmed = client
        .patch(format!("{base}/api/orders/{id}/status"))
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(confirmed.status(), StatusCode::OK);

    let cancelled = client
        .patch(format!("{base}/api/orders/{id}/status"))
        .json(&json!({ "status": OrderStatus::Cancelled.as_str() }))
        .send()
        .await
        .unwrap();
    assert_eq!(cancelled.status(), StatusCode::OK);

    // Cancelled is final.
    let reopened = client
        .patch(format!("{base}/api/orders/{id}/status"))
        .json(&json!({ "status": "pending" }))
        .send()
        .await
        .unwrap();
    assert_eq!(reopened.status(), StatusCode::CONFLICT);

    let receipt = client
        .get(format!("{base}/api/orders/{id}/receipt"))
        .send()
        .await
        .unwrap();
    assert_eq!(receipt.status(), StatusCode::OK);
    assert!(receipt.bytes().await.unwrap().starts_with(b"%PDF"));

    let deleted = client
        .delete(format!("{base}/api/orders/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let deleted_again = client
        .delete(format!("{base}/api/orders/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted_again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_dashboard_shape() {
    let client = admin_client().await;
    let resp = client
        .get(format!("{}/api/dashboard", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert!(body["low_stock"].is_array());
    assert!(body["recent_orders"].as_array().unwrap().len() <= 5);
    assert!(body["low_stock_threshold"].is_number());
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_courier_settings_mask_keys() {
    let client = admin_client().await;
    let base = admin_url();

    let resp = client
        .post(format!("{base}/api/courier-settings"))
        .json(&json!({
            "name": unique("Sandbox"),
            "api_key": "sandbox-api-key-1234",
            "secret_key": "sandbox-secret-5678",
            "base_url": "https://sandbox.example.com/api/v1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let setting = json_body(resp).await;
    let id = setting["id"].as_i64().unwrap();
    assert_eq!(setting["api_key"], "****************1234");
    assert_eq!(setting["is_active"], false);
    assert!(!setting.to_string().contains("sandbox-secret"));

    let missing_keys = client
        .post(format!("{base}/api/courier-settings"))
        .json(&json!({ "name": "No keys" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_keys.status(), StatusCode::BAD_REQUEST);

    let deleted = client
        .delete(format!("{base}/api/courier-settings/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}

async fn create_courier_setting(client: &reqwest::Client, name: &str) -> i64 {
    let resp = client
        .post(format!("{}/api/courier-settings", admin_url()))
        .json(&json!({
            "name": unique(name),
            "api_key": "sandbox-api-key-1234",
            "secret_key": "sandbox-secret-5678"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await["id"].as_i64().unwrap()
}

async fn active_courier_ids(client: &reqwest::Client) -> Vec<i64> {
    let resp = client
        .get(format!("{}/api/courier-settings", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp)
        .await
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["is_active"] == true)
        .map(|s| s["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
#[ignore = "Requires running admin server and super admin credentials"]
async fn test_activating_courier_leaves_exactly_one_active() {
    let client = admin_client().await;
    let base = admin_url();
    let previously_active = active_courier_ids(&client).await;

    let first = create_courier_setting(&client, "Primary").await;
    let second = create_courier_setting(&client, "Backup").await;

    for id in [first, second] {
        let resp = client
            .post(format!("{base}/api/courier-settings/{id}/activate"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["is_active"], true);
    }

    assert_eq!(active_courier_ids(&client).await, vec![second]);

    let first_setting = json_body(
        client
            .get(format!("{base}/api/courier-settings/{first}"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(first_setting["is_active"], false);

    for id in [first, second] {
        let deleted = client
            .delete(format!("{base}/api/courier-settings/{id}"))
            .send()
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    }
    for id in previously_active {
        client
            .post(format!("{base}/api/courier-settings/{id}/activate"))
            .send()
            .await
            .unwrap();
    }
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_navbar_reorder_rejects_unknown_items() {
    let client = admin_client().await;
    let base = admin_url();

    let created = client
        .post(format!("{base}/api/navbar"))
        .json(&json!({
            "label": { "en": "Test Link", "bn": "পরীক্ষা" },
            "url": "/test-link",
            "is_active": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let id = json_body(created).await["id"].as_i64().unwrap();

    let unknown = client
        .put(format!("{base}/api/navbar/order"))
        .json(&json!({ "ids": [id, 2_000_000_000] }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let first = client
        .put(format!("{base}/api/navbar/order"))
        .json(&json!({ "ids": [id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let items = json_body(first).await;
    assert_eq!(items[0]["id"].as_i64(), Some(id));

    let deleted = client
        .delete(format!("{base}/api/navbar/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}
