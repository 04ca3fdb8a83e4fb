//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use dokan_core::{CategoryId, LocalizedText, ProductId};

use super::{RepositoryError, like_pattern};
use crate::models::{CategorySummary, Page, Product, ProductFilter, ProductInput, page_offset};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name_en: String,
    name_bn: String,
    description_en: String,
    description_bn: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    stock: i32,
    images: Vec<String>,
    sizes: Vec<String>,
    colors: Vec<String>,
    is_featured: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_id: Option<i32>,
    category_name_en: Option<String>,
    category_name_bn: Option<String>,
    category_slug: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category = match (row.category_id, row.category_name_en, row.category_slug) {
            (Some(id), Some(name_en), Some(slug)) => Some(CategorySummary {
                id: CategoryId::new(id),
                name: LocalizedText::new(name_en, row.category_name_bn.unwrap_or_default()),
                slug,
            }),
            _ => None,
        };

        Self {
            id: ProductId::new(row.id),
            name: LocalizedText::new(row.name_en, row.name_bn),
            description: LocalizedText::new(row.description_en, row.description_bn),
            category,
            price: row.price,
            discount_price: row.discount_price,
            stock: row.stock,
            images: row.images,
            sizes: row.sizes,
            colors: row.colors,
            is_featured: row.is_featured,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_PRODUCT: &str = "
    SELECT p.id, p.name_en, p.name_bn, p.description_en, p.description_bn,
           p.price, p.discount_price, p.stock, p.images, p.sizes, p.colors,
           p.is_featured, p.is_active, p.created_at, p.updated_at,
           c.id AS category_id, c.name_en AS category_name_en,
           c.name_bn AS category_name_bn, c.slug AS category_slug
    FROM shop.product p
    LEFT JOIN shop.category c ON c.id = p.category_id";

/// Shared `WHERE` clause for [`ProductRepository::list`] and its count.
const FILTER_WHERE: &str = "
    WHERE ($1::int IS NULL OR p.category_id = $1)
      AND ($2::text IS NULL OR c.slug = $2)
      AND ($3::text IS NULL OR p.name_en ILIKE $3 OR p.name_bn ILIKE $3)
      AND ($4::bool IS NULL OR p.is_featured = $4)
      AND (NOT $5 OR p.is_active)
      AND ($6::numeric IS NULL OR LEAST(COALESCE(p.discount_price, p.price), p.price) >= $6)
      AND ($7::numeric IS NULL OR LEAST(COALESCE(p.discount_price, p.price), p.price) <= $7)
      AND ($8::int IS NULL OR p.id <> $8)";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `filter`, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Page<Product>, RepositoryError> {
        let search = filter
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(like_pattern);
        let offset = page_offset(filter.page, filter.per_page);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM shop.product p
             LEFT JOIN shop.category c ON c.id = p.category_id
             {FILTER_WHERE}"
        ))
        .bind(filter.category_id)
        .bind(filter.category_slug.as_deref())
        .bind(search.as_deref())
        .bind(filter.featured)
        .bind(filter.active_only)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.exclude)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{SELECT_PRODUCT} {FILTER_WHERE} ORDER BY {} LIMIT $9 OFFSET $10",
            filter.sort.order_by()
        ))
        .bind(filter.category_id)
        .bind(filter.category_slug.as_deref())
        .bind(search.as_deref())
        .bind(filter.featured)
        .bind(filter.active_only)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.exclude)
        .bind(filter.per_page)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            total,
            filter.page,
            filter.per_page,
        ))
    }

    /// Get a product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get several products by ID. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{SELECT_PRODUCT} WHERE p.id = ANY($1) ORDER BY p.id"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.product
                (name_en, name_bn, description_en, description_bn, category_id, price,
                 discount_price, stock, images, sizes, colors, is_featured, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING id",
        )
        .bind(input.name.en.trim())
        .bind(input.name.bn.trim())
        .bind(input.description.en.trim())
        .bind(input.description.bn.trim())
        .bind(input.category_id)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(input.stock)
        .bind(&input.images)
        .bind(&input.sizes)
        .bind(&input.colors)
        .bind(input.is_featured)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "category does not exist"))?;

        self.get(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.product
             SET name_en = $2, name_bn = $3, description_en = $4, description_bn = $5,
                 category_id = $6, price = $7, discount_price = $8, stock = $9,
                 images = $10, sizes = $11, colors = $12, is_featured = $13,
                 is_active = $14, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.name.en.trim())
        .bind(input.name.bn.trim())
        .bind(input.description.en.trim())
        .bind(input.description.bn.trim())
        .bind(input.category_id)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(input.stock)
        .bind(&input.images)
        .bind(&input.sizes)
        .bind(&input.colors)
        .bind(input.is_featured)
        .bind(input.is_active)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "category does not exist"))?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Set the stock level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_stock(&self, id: ProductId, stock: i32) -> Result<Product, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.product SET stock = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(stock)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product, returning it so callers can clean up its images.
    ///
    /// Order lines keep their snapshot and lose the product link.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let product = self.get(id).await?.ok_or(RepositoryError::NotFound)?;

        let deleted = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(product)
    }

    /// Active products with stock at or below `threshold`, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{SELECT_PRODUCT} WHERE p.is_active AND p.stock <= $1 ORDER BY p.stock, p.id LIMIT 50"
        ))
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
