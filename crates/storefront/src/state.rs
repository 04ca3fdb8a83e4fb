//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use dokan_shared::receipt::{ReceiptError, ReceiptRenderer};

use crate::cache::ContentCache;
use crate::config::StorefrontConfig;
use crate::services::{GoogleAuthError, GoogleClient};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("google client: {0}")]
    Google(#[from] GoogleAuthError),
    #[error("receipt renderer: {0}")]
    Receipt(#[from] ReceiptError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    google: GoogleClient,
    receipts: ReceiptRenderer,
    content: ContentCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Google client cannot be built or the
    /// configured receipt font cannot be read.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let google = GoogleClient::new(&config.google)?;
        let receipts =
            ReceiptRenderer::new(&config.store_name, config.receipt_font_path.as_deref())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                google,
                receipts,
                content: ContentCache::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn google(&self) -> &GoogleClient {
        &self.inner.google
    }

    #[must_use]
    pub fn receipts(&self) -> &ReceiptRenderer {
        &self.inner.receipts
    }

    /// Cached categories, navbar and footer.
    #[must_use]
    pub fn content(&self) -> &ContentCache {
        &self.inner.content
    }
}
