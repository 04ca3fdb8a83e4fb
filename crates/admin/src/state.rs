//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use dokan_shared::db::CourierSettingRepository;
use dokan_shared::receipt::{ReceiptError, ReceiptRenderer};

use crate::auth::JwtKeys;
use crate::config::AdminConfig;
use crate::error::{AppError, Result};
use crate::steadfast::{SteadfastClient, client::http_client};
use crate::uploads::ImageStore;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
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
    config: AdminConfig,
    pool: PgPool,
    jwt: JwtKeys,
    images: ImageStore,
    receipts: ReceiptRenderer,
    http: reqwest::Client,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the configured
    /// receipt font cannot be read.
    pub fn new(config: AdminConfig, pool: PgPool) -> std::result::Result<Self, StateError> {
        let http = http_client()?;
        let jwt = JwtKeys::new(&config.jwt.secret, config.jwt.ttl_hours);
        let images = ImageStore::from_config(&config.uploads, http.clone());
        let receipts =
            ReceiptRenderer::new(&config.store_name, config.receipt_font_path.as_deref())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                jwt,
                images,
                receipts,
                http,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }

    #[must_use]
    pub fn receipts(&self) -> &ReceiptRenderer {
        &self.inner.receipts
    }

    /// Shared outbound HTTP client (Steadfast, Cloudinary).
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Steadfast client for the active courier account.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PreconditionFailed` if no courier account is active.
    pub async fn active_courier(&self) -> Result<SteadfastClient> {
        let setting = CourierSettingRepository::new(self.pool())
            .get_active()
            .await?
            .ok_or_else(|| {
                AppError::PreconditionFailed(
                    "No active courier account. Activate one under courier settings.".to_string(),
                )
            })?;
        Ok(SteadfastClient::new(self.http().clone(), &setting))
    }
}
