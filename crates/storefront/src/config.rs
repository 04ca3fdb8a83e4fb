//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `STOREFRONT_BASE_URL` - Public URL of this API (used for the OAuth callback)
//! - `STOREFRONT_SESSION_SECRET` - Session cookie signing secret (min 32 chars, high entropy)
//! - `FRONTEND_URL` - Storefront frontend, where OAuth redirects land
//! - `GOOGLE_CLIENT_ID` - Google OAuth client ID
//! - `GOOGLE_CLIENT_SECRET` - Google OAuth client secret
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins (default: `FRONTEND_URL`)
//! - `SHIPPING_CHARGE_INSIDE_DHAKA` - Taka (default: 60)
//! - `SHIPPING_CHARGE_OUTSIDE_DHAKA` - Taka (default: 120)
//! - `ORDER_NUMBER_PREFIX` - Order number prefix (default: DK)
//! - `STORE_NAME` - Shown on receipts (default: Dokan)
//! - `RECEIPT_FONT_PATH` - TTF with Bengali glyphs for receipts
//! - `LOG_FORMAT` - `json` for structured logs
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use rust_decimal::Decimal;
use secrecy::SecretString;

use dokan_core::DeliveryArea;
use dokan_shared::config::{
    ConfigError, get_database_url, get_env_or_default, get_optional_env, get_required_env,
    get_validated_secret, parse_env, parse_origins,
};

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this API
    pub base_url: String,
    /// Storefront frontend URL
    pub frontend_url: String,
    /// Session cookie signing secret
    pub session_secret: SecretString,
    /// Origins allowed to call the API with credentials
    pub cors_allowed_origins: Vec<String>,
    pub google: GoogleConfig,
    pub shipping: ShippingRates,
    pub order_number_prefix: String,
    pub store_name: String,
    pub receipt_font_path: Option<PathBuf>,
    pub json_logs: bool,
    pub sentry: SentryConfig,
}

/// Google OAuth client credentials.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Flat delivery charges by area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingRates {
    pub inside_dhaka: Decimal,
    pub outside_dhaka: Decimal,
}

impl ShippingRates {
    /// Charge for delivering to `area`.
    #[must_use]
    pub const fn charge(&self, area: DeliveryArea) -> Decimal {
        match area {
            DeliveryArea::InsideDhaka => self.inside_dhaka,
            DeliveryArea::OutsideDhaka => self.outside_dhaka,
        }
    }
}

/// Sentry error tracking settings.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl SentryConfig {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env("SENTRY_SAMPLE_RATE", 1.0)?,
            traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_env("STOREFRONT_PORT", 3000_u16)?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        let frontend_url = get_required_env("FRONTEND_URL")?
            .trim_end_matches('/')
            .to_string();

        let cors_allowed_origins = get_optional_env("CORS_ALLOWED_ORIGINS")
            .map_or_else(|| vec![frontend_url.clone()], |raw| parse_origins(&raw));

        let google = GoogleConfig {
            client_id: get_required_env("GOOGLE_CLIENT_ID")?,
            client_secret: SecretString::from(get_required_env("GOOGLE_CLIENT_SECRET")?),
        };

        let shipping = ShippingRates {
            inside_dhaka: parse_env("SHIPPING_CHARGE_INSIDE_DHAKA", Decimal::from(60))?,
            outside_dhaka: parse_env("SHIPPING_CHARGE_OUTSIDE_DHAKA", Decimal::from(120))?,
        };
        if shipping.inside_dhaka.is_sign_negative() || shipping.outside_dhaka.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "SHIPPING_CHARGE_*".to_string(),
                "shipping charges cannot be negative".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            frontend_url,
            session_secret,
            cors_allowed_origins,
            google,
            shipping,
            order_number_prefix: get_env_or_default("ORDER_NUMBER_PREFIX", "DK"),
            store_name: get_env_or_default("STORE_NAME", "Dokan"),
            receipt_font_path: get_optional_env("RECEIPT_FONT_PATH").map(PathBuf::from),
            json_logs: get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Redirect URI registered with Google.
    #[must_use]
    pub fn google_redirect_uri(&self) -> String {
        format!("{}/auth/google/callback", self.base_url)
    }
}
