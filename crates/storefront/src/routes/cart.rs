//! Cart route handlers.
//!
//! The cart lives in the session. Every read prices it against the current
//! catalog and writes back the cleaned-up cart.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use dokan_core::ProductId;
use dokan_shared::db::ProductRepository;

use crate::error::{AppError, Result};
use crate::middleware::Lang;
use crate::models::{Cart, CartError, CartView, session_keys};
use crate::state::AppState;

/// Load the cart from the session (empty when absent).
pub(crate) async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Save the cart to the session.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    if cart.is_empty() {
        session.remove::<Cart>(session_keys::CART).await?;
    } else {
        session.insert(session_keys::CART, cart).await?;
    }
    Ok(())
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::NotInCart => Self::NotFound(capitalize(&err.to_string())),
            CartError::InvalidQuantity | CartError::TooManyLines => {
                Self::BadRequest(capitalize(&err.to_string()))
            }
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Price the session cart and persist any adjustments.
async fn priced_cart(
    state: &AppState,
    session: &Session,
    lang: dokan_core::Language,
) -> Result<CartView> {
    let cart = load_cart(session).await?;
    if cart.is_empty() {
        return Ok(CartView::price(&cart, &[], lang).0);
    }

    let products = ProductRepository::new(state.pool())
        .get_many(&cart.product_ids())
        .await?;
    let (view, kept) = CartView::price(&cart, &products, lang);
    if kept != cart {
        save_cart(session, &kept).await?;
    }
    Ok(view)
}

/// `POST /api/cart/items` body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

const fn default_quantity() -> i32 {
    1
}

/// `PATCH /api/cart/items/{product_id}` body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Show the priced cart.
///
/// # Route
///
/// `GET /api/cart`
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Lang(lang): Lang,
) -> Result<Json<CartView>> {
    Ok(Json(priced_cart(&state, &session, lang).await?))
}

/// Add a product to the cart.
///
/// Rejects products that are hidden or have fewer units in stock than the
/// resulting line quantity.
///
/// # Route
///
/// `POST /api/cart/items`
#[instrument(skip(state, session))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Lang(lang): Lang,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let product = ProductRepository::new(state.pool())
        .get(body.product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if let Some(size) = body.size.as_deref()
        && !product.sizes.is_empty()
        && !product.sizes.iter().any(|s| s == size)
    {
        return Err(AppError::BadRequest(format!("Size {size} is not available")));
    }
    if let Some(color) = body.color.as_deref()
        && !product.colors.is_empty()
        && !product.colors.iter().any(|c| c == color)
    {
        return Err(AppError::BadRequest(format!("Color {color} is not available")));
    }

    let mut cart = load_cart(&session).await?;
    cart.add(product.id, body.quantity, body.size, body.color)?;

    let in_cart = cart
        .lines
        .iter()
        .find(|l| l.product_id == product.id)
        .map_or(0, |l| l.quantity);
    if !product.can_fulfil(in_cart) {
        return Err(AppError::Conflict(format!(
            "Only {} left in stock",
            product.stock.max(0)
        )));
    }

    save_cart(&session, &cart).await?;
    Ok(Json(priced_cart(&state, &session, lang).await?))
}

/// Change a line's quantity (0 removes it).
///
/// # Route
///
/// `PATCH /api/cart/items/{product_id}`
#[instrument(skip(state, session))]
pub async fn update_item(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Lang(lang): Lang,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(product_id, body.quantity)?;
    save_cart(&session, &cart).await?;
    Ok(Json(priced_cart(&state, &session, lang).await?))
}

/// Remove a line.
///
/// # Route
///
/// `DELETE /api/cart/items/{product_id}`
#[instrument(skip(state, session))]
pub async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Lang(lang): Lang,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if !cart.remove(product_id) {
        return Err(CartError::NotInCart.into());
    }
    save_cart(&session, &cart).await?;
    Ok(Json(priced_cart(&state, &session, lang).await?))
}

/// Empty the cart.
///
/// # Route
///
/// `DELETE /api/cart`
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<StatusCode> {
    save_cart(&session, &Cart::default()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_errors_map_to_app_errors() {
        assert!(matches!(
            AppError::from(CartError::NotInCart),
            AppError::NotFound(msg) if msg == "Product is not in the cart"
        ));
        assert!(matches!(
            AppError::from(CartError::InvalidQuantity),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_add_request_defaults_quantity() {
        let body: AddItemRequest = serde_json::from_str(r#"{"product_id":7}"#).unwrap();
        assert_eq!(body.product_id, ProductId::new(7));
        assert_eq!(body.quantity, 1);
    }
}
