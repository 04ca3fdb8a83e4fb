//! Wishlist repository for signed-in customers.

use sqlx::PgPool;

use dokan_core::{CustomerId, ProductId};

use super::RepositoryError;

/// Repository for persisted wishlists.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Product IDs on the customer's wishlist, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, customer: CustomerId) -> Result<Vec<ProductId>, RepositoryError> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT product_id FROM shop.wishlist_item
             WHERE customer_id = $1
             ORDER BY created_at DESC, product_id",
        )
        .bind(customer)
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().map(ProductId::new).collect())
    }

    /// Add a product. Adding one that is already there is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn add(&self, customer: CustomerId, product: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO shop.wishlist_item (customer_id, product_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(customer)
        .bind(product)
        .execute(self.pool)
        .await
        .map_err(|e| match RepositoryError::from_constraint(e, "product does not exist") {
            RepositoryError::Conflict(_) => RepositoryError::NotFound,
            other => other,
        })?;

        Ok(())
    }

    /// Remove a product. Returns whether it was on the list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        customer: CustomerId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query(
            "DELETE FROM shop.wishlist_item WHERE customer_id = $1 AND product_id = $2",
        )
        .bind(customer)
        .bind(product)
        .execute(self.pool)
        .await?;

        Ok(deleted.rows_affected() > 0)
    }

    /// Merge a guest wishlist into the customer's. Unknown products are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn merge(
        &self,
        customer: CustomerId,
        products: &[ProductId],
    ) -> Result<u64, RepositoryError> {
        if products.is_empty() {
            return Ok(0);
        }
        let ids: Vec<i32> = products.iter().map(ProductId::as_i32).collect();

        let inserted = sqlx::query(
            "INSERT INTO shop.wishlist_item (customer_id, product_id)
             SELECT $1, p.id FROM shop.product p WHERE p.id = ANY($2)
             ON CONFLICT DO NOTHING",
        )
        .bind(customer)
        .bind(&ids)
        .execute(self.pool)
        .await?;

        Ok(inserted.rows_affected())
    }
}
