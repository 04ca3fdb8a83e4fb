//! Product management.
//!
//! Create and update take `multipart/form-data`. Text fields carry the
//! product, `images` files carry new pictures, and `sizes`, `colors` and
//! `existing_images` are JSON-encoded arrays.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use dokan_core::{CategoryId, LocalizedText, ProductId};
use dokan_shared::db::{CategoryRepository, ProductRepository, RepositoryError};
use dokan_shared::models::{Page, Product, ProductFilter, ProductInput, ProductSort, clamp_paging};

use crate::error::{AppError, Result};
use crate::forms::FormData;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Most images one product may carry.
pub const MAX_IMAGES: usize = 10;

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

/// A product with its computed discount.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub discount_percentage: Option<u8>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            discount_percentage: product.discount_percentage(),
            product,
        }
    }
}

/// Query parameters for `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminProductQuery {
    pub category_id: Option<CategoryId>,
    /// Category slug.
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    /// Only active products when `true`. Everything by default.
    pub active: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl AdminProductQuery {
    fn into_filter(self) -> Result<ProductFilter> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(AppError::BadRequest(
                "min_price cannot be greater than max_price".to_string(),
            ));
        }

        let (page, per_page) = clamp_paging(self.page, self.per_page);
        Ok(ProductFilter {
            category_id: self.category_id,
            category_slug: self.category.filter(|s| !s.trim().is_empty()),
            search: self.search.filter(|s| !s.trim().is_empty()),
            featured: self.featured,
            active_only: self.active.unwrap_or(false),
            min_price: self.min_price,
            max_price: self.max_price,
            exclude: None,
            sort: self.sort,
            page,
            per_page,
        })
    }
}

/// Body of `PATCH /api/products/{id}/stock`.
#[derive(Debug, Deserialize)]
pub struct StockUpdate {
    pub stock: i32,
}

/// Build a validated input from form fields. `images` is filled in by the
/// caller once files are stored.
async fn product_input(state: &AppState, form: &FormData) -> Result<ProductInput> {
    let name_en = form.required("name_en")?;
    let name_bn = form.text_owned("name_bn").unwrap_or_default();

    let price = form
        .parse::<Decimal>("price")?
        .ok_or_else(|| AppError::BadRequest("Field 'price' is required".to_string()))?;

    // 0 or blank means "no category".
    let category_id = form
        .parse::<CategoryId>("category_id")?
        .filter(|id| id.as_i32() > 0);
    if let Some(id) = category_id
        && CategoryRepository::new(state.pool()).get(id).await?.is_none()
    {
        return Err(AppError::BadRequest("Category does not exist".to_string()));
    }

    let input = ProductInput {
        name: LocalizedText::new(name_en, name_bn),
        description: LocalizedText::new(
            form.text_owned("description_en").unwrap_or_default(),
            form.text_owned("description_bn").unwrap_or_default(),
        ),
        category_id,
        price: price.round_dp(2),
        discount_price: form.parse::<Decimal>("discount_price")?.map(|d| d.round_dp(2)),
        stock: form.parse("stock")?.unwrap_or(0),
        images: Vec::new(),
        sizes: form.string_list("sizes")?.unwrap_or_default(),
        colors: form.string_list("colors")?.unwrap_or_default(),
        is_featured: form.bool("is_featured")?.unwrap_or(false),
        is_active: form.bool("is_active")?.unwrap_or(true),
    };
    input.validate().map_err(AppError::BadRequest)?;
    Ok(input)
}

/// Images kept on update: the listed ones that really belong to the
/// product, in the listed order. `None` keeps everything.
fn kept_images(existing: &[String], listed: Option<Vec<String>>) -> Vec<String> {
    match listed {
        None => existing.to_vec(),
        Some(listed) => listed
            .into_iter()
            .filter(|url| existing.contains(url))
            .fold(Vec::new(), |mut kept, url| {
                if !kept.contains(&url) {
                    kept.push(url);
                }
                kept
            }),
    }
}

fn check_image_count(count: usize) -> Result<()> {
    if count > MAX_IMAGES {
        return Err(AppError::BadRequest(format!(
            "A product can have at most {MAX_IMAGES} images"
        )));
    }
    Ok(())
}

/// List products, including inactive ones.
///
/// # Route
///
/// `GET /api/products`
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<AdminProductQuery>,
) -> Result<Json<Page<ProductResponse>>> {
    let filter = query.into_filter()?;
    let page = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(page.map(ProductResponse::from)))
}

/// Show one product.
///
/// # Route
///
/// `GET /api/products/{id}`
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(|p| Json(p.into()))
        .ok_or_else(not_found)
}

/// Create a product with its images.
///
/// # Route
///
/// `POST /api/products`
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let mut form = FormData::from_multipart(multipart).await?;
    let mut input = product_input(&state, &form).await?;

    let files = form.take_files("images");
    check_image_count(files.len())?;
    let urls = state.images().store_all(&files).await?;
    input.images.clone_from(&urls);

    match ProductRepository::new(state.pool()).create(&input).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, images = urls.len(), "Product created");
            Ok((StatusCode::CREATED, Json(product.into())))
        }
        Err(e) => {
            state.images().delete_all(&urls).await;
            Err(e.into())
        }
    }
}

/// Update a product. `existing_images` lists the current images to keep,
/// new `images` files are appended, and images no longer used are deleted
/// from storage.
///
/// # Route
///
/// `PUT /api/products/{id}`
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>> {
    let repo = ProductRepository::new(state.pool());
    let existing = repo.get(id).await?.ok_or_else(not_found)?;

    let mut form = FormData::from_multipart(multipart).await?;
    let mut input = product_input(&state, &form).await?;

    let kept = kept_images(&existing.images, form.string_list("existing_images")?);
    let files = form.take_files("images");
    check_image_count(kept.len() + files.len())?;

    let uploaded = state.images().store_all(&files).await?;
    input.images = kept.iter().chain(&uploaded).cloned().collect();

    match repo.update(id, &input).await {
        Ok(product) => {
            let dropped: Vec<String> = existing
                .images
                .into_iter()
                .filter(|url| !product.images.contains(url))
                .collect();
            state.images().delete_all(&dropped).await;
            tracing::info!(
                product_id = %id,
                added = uploaded.len(),
                removed = dropped.len(),
                "Product updated"
            );
            Ok(Json(product.into()))
        }
        Err(e) => {
            state.images().delete_all(&uploaded).await;
            Err(e.into())
        }
    }
}

/// Set a product's stock level.
///
/// # Route
///
/// `PATCH /api/products/{id}/stock`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_stock(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<StockUpdate>,
) -> Result<Json<ProductResponse>> {
    if body.stock < 0 {
        return Err(AppError::BadRequest("Stock cannot be negative".to_string()));
    }

    let product = ProductRepository::new(state.pool())
        .set_stock(id, body.stock)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => not_found(),
            other => other.into(),
        })?;

    tracing::info!(product_id = %id, stock = body.stock, "Stock updated");
    Ok(Json(product.into()))
}

/// Delete a product and its images. Past orders keep their snapshot.
///
/// # Route
///
/// `DELETE /api/products/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    let deleted = ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => not_found(),
            other => other.into(),
        })?;

    state.images().delete_all(&deleted.images).await;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_kept_images_defaults_to_all() {
        let existing = urls(&["a.jpg", "b.jpg"]);
        assert_eq!(kept_images(&existing, None), existing);
    }

    #[test]
    fn test_kept_images_filters_and_reorders() {
        let existing = urls(&["a.jpg", "b.jpg", "c.jpg"]);
        let listed = urls(&["c.jpg", "https://evil.example/x.jpg", "a.jpg", "c.jpg"]);
        assert_eq!(kept_images(&existing, Some(listed)), urls(&["c.jpg", "a.jpg"]));
        assert!(kept_images(&existing, Some(vec![])).is_empty());
    }

    #[test]
    fn test_image_count_limit() {
        assert!(check_image_count(MAX_IMAGES).is_ok());
        assert!(check_image_count(MAX_IMAGES + 1).is_err());
    }

    #[test]
    fn test_query_into_filter_includes_inactive() {
        let filter = AdminProductQuery::default().into_filter().unwrap();
        assert!(!filter.active_only);
        assert_eq!((filter.page, filter.per_page), (1, 20));

        let bad = AdminProductQuery {
            min_price: Some(Decimal::from(500)),
            max_price: Some(Decimal::from(100)),
            ..AdminProductQuery::default()
        };
        assert!(bad.into_filter().is_err());
    }
}
