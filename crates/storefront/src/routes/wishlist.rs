//! Wishlist route handlers.
//!
//! Signed-in customers' wishlists are stored in the database. Guests keep
//! product IDs in the session, merged into their account on sign-in.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tower_sessions::Session;
use tracing::instrument;

use dokan_core::ProductId;
use dokan_shared::db::{ProductRepository, WishlistRepository};

use crate::error::{AppError, Result};
use crate::middleware::{Lang, OptionalCustomer};
use crate::models::{ProductView, session_keys};
use crate::state::AppState;

/// Most products a guest wishlist keeps.
const GUEST_WISHLIST_LIMIT: usize = 100;

async fn guest_ids(session: &Session) -> Result<Vec<ProductId>> {
    Ok(session
        .get::<Vec<ProductId>>(session_keys::GUEST_WISHLIST)
        .await?
        .unwrap_or_default())
}

/// Add `product` to a guest list, newest first, without duplicates.
fn push_guest(ids: &mut Vec<ProductId>, product: ProductId) {
    ids.retain(|id| *id != product);
    ids.insert(0, product);
    ids.truncate(GUEST_WISHLIST_LIMIT);
}

/// Wishlist products, in the order they were added (newest first).
///
/// # Route
///
/// `GET /api/wishlist`
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
    Lang(lang): Lang,
) -> Result<Json<Vec<ProductView>>> {
    let ids = match &customer {
        Some(c) => WishlistRepository::new(state.pool()).list(c.id).await?,
        None => guest_ids(&session).await?,
    };
    if ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let products = ProductRepository::new(state.pool()).get_many(&ids).await?;
    let views = ids
        .iter()
        .filter_map(|id| products.iter().find(|p| p.id == *id && p.is_active))
        .map(|p| ProductView::new(p, lang))
        .collect();
    Ok(Json(views))
}

/// Add a product.
///
/// # Route
///
/// `POST /api/wishlist/{product_id}`
#[instrument(skip(state, session, customer))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    match customer {
        Some(c) => {
            WishlistRepository::new(state.pool())
                .add(c.id, product_id)
                .await?;
        }
        None => {
            let mut ids = guest_ids(&session).await?;
            push_guest(&mut ids, product_id);
            session.insert(session_keys::GUEST_WISHLIST, &ids).await?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a product.
///
/// # Route
///
/// `DELETE /api/wishlist/{product_id}`
#[instrument(skip(state, session, customer))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    let removed = match customer {
        Some(c) => {
            WishlistRepository::new(state.pool())
                .remove(c.id, product_id)
                .await?
        }
        None => {
            let mut ids = guest_ids(&session).await?;
            let before = ids.len();
            ids.retain(|id| *id != product_id);
            let removed = ids.len() != before;
            if removed {
                session.insert(session_keys::GUEST_WISHLIST, &ids).await?;
            }
            removed
        }
    };

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Product is not on the wishlist".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_guest_dedupes_and_orders() {
        let mut ids = vec![ProductId::new(1), ProductId::new(2)];
        push_guest(&mut ids, ProductId::new(2));
        assert_eq!(ids, vec![ProductId::new(2), ProductId::new(1)]);

        for n in 10..200 {
            push_guest(&mut ids, ProductId::new(n));
        }
        assert_eq!(ids.len(), GUEST_WISHLIST_LIMIT);
        assert_eq!(ids.first(), Some(&ProductId::new(199)));
    }
}
