//! Category and product browsing.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use dokan_core::ProductId;
use dokan_shared::db::ProductRepository;
use dokan_shared::models::{Page, ProductFilter, ProductSort, clamp_paging};

use crate::error::{AppError, Result};
use crate::middleware::Lang;
use crate::models::{CategoryView, ProductView};
use crate::state::AppState;

/// Products shown under "related products".
const RELATED_LIMIT: i64 = 8;

/// Query parameters for `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Category slug.
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ProductQuery {
    /// Shopper-facing filter: active products only, paging clamped.
    pub(crate) fn into_filter(self) -> Result<ProductFilter> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(AppError::BadRequest(
                "min_price cannot be greater than max_price".to_string(),
            ));
        }

        let (page, per_page) = clamp_paging(self.page, self.per_page);
        Ok(ProductFilter {
            category_slug: self.category.filter(|s| !s.trim().is_empty()),
            search: self.search.filter(|s| !s.trim().is_empty()),
            featured: self.featured,
            active_only: true,
            min_price: self.min_price,
            max_price: self.max_price,
            sort: self.sort,
            page,
            per_page,
            ..ProductFilter::default()
        })
    }
}

/// List all categories.
///
/// # Route
///
/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    Lang(lang): Lang,
) -> Result<Json<Vec<CategoryView>>> {
    let categories = state.content().categories(state.pool()).await?;
    Ok(Json(
        categories
            .iter()
            .map(|c| CategoryView::new(c, lang))
            .collect(),
    ))
}

/// Show one category by slug.
///
/// # Route
///
/// `GET /api/categories/{slug}`
#[instrument(skip(state))]
pub async fn show_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Lang(lang): Lang,
) -> Result<Json<CategoryView>> {
    let categories = state.content().categories(state.pool()).await?;
    categories
        .iter()
        .find(|c| c.slug == slug)
        .map(|c| Json(CategoryView::new(c, lang)))
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// List active products.
///
/// # Route
///
/// `GET /api/products`
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
    Lang(lang): Lang,
) -> Result<Json<Page<ProductView>>> {
    let filter = query.into_filter()?;
    let page = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(page.map(|p| ProductView::new(&p, lang))))
}

/// Show one active product.
///
/// # Route
///
/// `GET /api/products/{id}`
#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Lang(lang): Lang,
) -> Result<Json<ProductView>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(ProductView::new(&product, lang)))
}

/// Other active products from the same category.
///
/// # Route
///
/// `GET /api/products/{id}/related`
#[instrument(skip(state))]
pub async fn related_products(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Lang(lang): Lang,
) -> Result<Json<Vec<ProductView>>> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let Some(category) = product.category else {
        return Ok(Json(Vec::new()));
    };

    let filter = ProductFilter {
        category_id: Some(category.id),
        exclude: Some(product.id),
        active_only: true,
        per_page: RELATED_LIMIT,
        ..ProductFilter::default()
    };
    let page = repo.list(&filter).await?;

    Ok(Json(
        page.items
            .iter()
            .map(|p| ProductView::new(p, lang))
            .collect(),
    ))
}
