//! Storefront API tests.
//!
//! Require a migrated and seeded database and a running storefront
//! (`cargo run -p dokan-storefront`).

#![allow(clippy::unwrap_used)]

use dokan_integration_tests::{cookie_client, json_body, storefront_url};
use reqwest::StatusCode;
use serde_json::{Value, json};

/// First active product with stock, from the public listing.
async fn in_stock_product(client: &reqwest::Client) -> Value {
    product_with_stock(client, 2).await
}

/// First active product with at least `min_stock` units.
async fn product_with_stock(client: &reqwest::Client, min_stock: i64) -> Value {
    let resp = client
        .get(format!("{}/api/products?per_page=50", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let page = json_body(resp).await;
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["stock"].as_i64().unwrap_or(0) >= min_stock)
        .cloned()
        .expect("seeded catalog should have a product in stock")
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = reqwest::get(format!("{}/health", storefront_url()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_product_listing_pages_and_filters() {
    let client = cookie_client();
    let base = storefront_url();

    let page = json_body(
        client
            .get(format!("{base}/api/products?page=1&per_page=2&sort=price_asc"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let items = page["items"].as_array().unwrap();
    assert!(items.len() <= 2);
    assert_eq!(page["page"], 1);

    let resp = client
        .get(format!("{base}/api/products?min_price=500&max_price=100"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_category_is_404() {
    let resp = reqwest::get(format!(
        "{}/api/categories/no-such-category-slug",
        storefront_url()
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_cart_add_update_remove() {
    let client = cookie_client();
    let base = storefront_url();
    let product = in_stock_product(&client).await;
    let id = product["id"].as_i64().unwrap();

    let cart = json_body(
        client
            .post(format!("{base}/api/cart/items"))
            .json(&json!({ "product_id": id, "quantity": 1 }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(cart["item_count"], 1);

    let cart = json_body(
        client
            .patch(format!("{base}/api/cart/items/{id}"))
            .json(&json!({ "quantity": 2 }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(cart["item_count"], 2);

    let resp = client
        .delete(format!("{base}/api/cart/items/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cart = json_body(resp).await;
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_cart_rejects_more_than_stock() {
    let client = cookie_client();
    let product = in_stock_product(&client).await;
    let stock = product["stock"].as_i64().unwrap();

    let resp = client
        .post(format!("{}/api/cart/items", storefront_url()))
        .json(&json!({ "product_id": product["id"], "quantity": stock + 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_guest_checkout_and_tracking() {
    let client = cookie_client();
    let base = storefront_url();
    let product = in_stock_product(&client).await;

    let resp = client
        .post(format!("{base}/api/orders"))
        .json(&json!({
            "customer_name": "Integration Test",
            "phone": "01812345678",
            "address": "House 1, Road 2, Mirpur",
            "city": "Dhaka",
            "delivery_area": "inside_dhaka",
            "payment_method": "cash_on_delivery",
            "items": [{ "product_id": product["id"], "quantity": 1 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let order = json_body(resp).await;
    let number = order["order_number"].as_str().unwrap().to_string();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["items"].as_array().unwrap().len(), 1);

    // Tracking needs the phone used at checkout, in any accepted format.
    let tracked = client
        .get(format!("{base}/api/orders/track"))
        .query(&[("number", number.as_str()), ("phone", "+8801812345678")])
        .send()
        .await
        .unwrap();
    assert_eq!(tracked.status(), StatusCode::OK);

    let wrong_phone = client
        .get(format!("{base}/api/orders/track"))
        .query(&[("number", number.as_str()), ("phone", "01999999999")])
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_phone.status(), StatusCode::NOT_FOUND);

    let receipt = client
        .get(format!("{base}/api/orders/{number}/receipt"))
        .query(&[("phone", "01812345678")])
        .send()
        .await
        .unwrap();
    assert_eq!(receipt.status(), StatusCode::OK);
    assert_eq!(
        receipt.headers()["content-type"].to_str().unwrap(),
        "application/pdf"
    );
    assert!(receipt.bytes().await.unwrap().starts_with(b"%PDF"));
}

fn checkout_body(items: &Value) -> Value {
    json!({
        "customer_name": "Integration Test",
        "phone": "01812345678",
        "address": "House 1, Road 2, Mirpur",
        "city": "Dhaka",
        "delivery_area": "outside_dhaka",
        "payment_method": "cash_on_delivery",
        "items": items
    })
}

fn order_sequence(order: &Value) -> i64 {
    order["order_number"]
        .as_str()
        .unwrap()
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_keeps_sizes_as_separate_lines() {
    let client = cookie_client();
    let base = storefront_url();
    let product = product_with_stock(&client, 4).await;
    let id = product["id"].as_i64().unwrap();
    let stock = product["stock"].as_i64().unwrap();

    let resp = client
        .post(format!("{base}/api/orders"))
        .json(&checkout_body(&json!([
            { "product_id": id, "quantity": 1, "size": "M" },
            { "product_id": id, "quantity": 2, "size": "L" }
        ])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first = json_body(resp).await;

    let items = first["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let quantity_of = |size: &str| {
        items
            .iter()
            .find(|i| i["size"] == size)
            .map(|i| i["quantity"].as_i64().unwrap())
    };
    assert_eq!(quantity_of("M"), Some(1));
    assert_eq!(quantity_of("L"), Some(2));

    // Both sizes draw on the same stock.
    let after = json_body(
        client
            .get(format!("{base}/api/products/{id}"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(after["stock"].as_i64().unwrap(), stock - 3);

    let resp = client
        .post(format!("{base}/api/orders"))
        .json(&checkout_body(&json!([{ "product_id": id, "quantity": 1 }])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let second = json_body(resp).await;
    assert!(order_sequence(&second) > order_sequence(&first));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_huge_page_number_is_an_empty_page() {
    let resp = cookie_client()
        .get(format!(
            "{}/api/products?page=9223372036854775807&per_page=100",
            storefront_url()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let page = json_body(resp).await;
    assert!(page["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_with_empty_cart_is_rejected() {
    let resp = cookie_client()
        .post(format!("{}/api/orders", storefront_url()))
        .json(&json!({
            "customer_name": "Integration Test",
            "phone": "01812345678",
            "address": "House 1, Road 2, Mirpur",
            "city": "Dhaka",
            "delivery_area": "inside_dhaka",
            "payment_method": "cash_on_delivery"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_guest_wishlist_lives_in_session() {
    let client = cookie_client();
    let base = storefront_url();
    let product = in_stock_product(&client).await;
    let id = product["id"].as_i64().unwrap();

    let resp = client
        .post(format!("{base}/api/wishlist/{id}"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let list = json_body(
        client
            .get(format!("{base}/api/wishlist"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert!(
        list.as_array()
            .unwrap()
            .iter()
            .any(|p| p["id"].as_i64() == Some(id))
    );

    // A different session sees an empty wishlist.
    let other = json_body(
        cookie_client()
            .get(format!("{base}/api/wishlist"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert!(other.as_array().unwrap().is_empty());
}
