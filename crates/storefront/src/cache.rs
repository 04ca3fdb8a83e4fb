//! Short-lived cache for navigation data every page requests.
//!
//! Categories, navbar and footer change rarely and are read on every page
//! load, so they are cached in memory with `moka` for 60 seconds. Admin
//! edits become visible once the entry expires.

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use dokan_shared::db::{CategoryRepository, ContentRepository, RepositoryError};
use dokan_shared::models::{Category, Footer, NavbarItem};

const TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    Navbar,
    Footer,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Vec<Category>),
    Navbar(Vec<NavbarItem>),
    Footer(Option<Footer>),
}

/// Cached reads of categories, navbar and footer.
#[derive(Clone)]
pub struct ContentCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().max_capacity(16).time_to_live(TTL).build(),
        }
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn categories(&self, pool: &PgPool) -> Result<Vec<Category>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) = self.cache.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let categories = CategoryRepository::new(pool).list().await?;
        self.cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Active navbar items in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn navbar(&self, pool: &PgPool) -> Result<Vec<NavbarItem>, RepositoryError> {
        if let Some(CacheValue::Navbar(items)) = self.cache.get(&CacheKey::Navbar).await {
            return Ok(items);
        }

        let items = ContentRepository::new(pool).list_navbar(true).await?;
        self.cache
            .insert(CacheKey::Navbar, CacheValue::Navbar(items.clone()))
            .await;
        Ok(items)
    }

    /// The footer, if one has been saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn footer(&self, pool: &PgPool) -> Result<Option<Footer>, RepositoryError> {
        if let Some(CacheValue::Footer(footer)) = self.cache.get(&CacheKey::Footer).await {
            return Ok(footer);
        }

        let footer = ContentRepository::new(pool).get_footer().await?;
        self.cache
            .insert(CacheKey::Footer, CacheValue::Footer(footer.clone()))
            .await;
        Ok(footer)
    }
}
