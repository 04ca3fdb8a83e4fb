//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `ADMIN_BASE_URL` - Public URL of this API
//! - `ADMIN_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_TOKEN_TTL_HOURS` - Token and cookie lifetime (default: 24)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated admin frontend origins
//! - `UPLOAD_DIR` - Local image directory (default: uploads)
//! - `UPLOAD_PUBLIC_URL` - URL prefix for local images (default: `ADMIN_BASE_URL/uploads`)
//! - `COURIER_SYNC_INTERVAL_SECS` - Background courier sync period (default: 0, disabled)
//! - `LOW_STOCK_THRESHOLD` - Dashboard low-stock level (default: 5)
//! - `STORE_NAME` - Shown on receipts (default: Dokan)
//! - `RECEIPT_FONT_PATH` - TTF with Bengali glyphs for receipts
//! - `LOG_FORMAT` - `json` for structured logs
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (Cloudinary, all or none)
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`
//! - `CLOUDINARY_FOLDER` - Upload folder (default: dokan)
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use dokan_shared::config::{
    ConfigError, get_database_url, get_env_or_default, get_optional_env, get_required_env,
    get_validated_secret, parse_env, parse_origins, validate_secret_strength,
};

/// Longest accepted token lifetime (30 days).
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 30;

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this API
    pub base_url: String,
    pub jwt: JwtConfig,
    /// Origins allowed to call the API with credentials
    pub cors_allowed_origins: Vec<String>,
    pub uploads: UploadConfig,
    /// Period of the background courier sync, `None` when disabled
    pub courier_sync_interval: Option<Duration>,
    pub low_stock_threshold: i32,
    pub store_name: String,
    pub receipt_font_path: Option<PathBuf>,
    pub json_logs: bool,
    pub sentry: SentryConfig,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Admin token signing settings.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub ttl_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

/// Where uploaded images go.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Local directory, served at `/uploads`
    pub dir: PathBuf,
    /// URL prefix for files in `dir`
    pub public_url: String,
    /// Cloudinary account; images go there instead of `dir` when set
    pub cloudinary: Option<CloudinaryConfig>,
}

/// Cloudinary signed-upload credentials.
///
/// Implements `Debug` manually to redact the API secret.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
    pub folder: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("folder", &self.folder)
            .finish()
    }
}

impl CloudinaryConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cloud_name = get_optional_env("CLOUDINARY_CLOUD_NAME");
        let api_key = get_optional_env("CLOUDINARY_API_KEY");
        let api_secret = get_optional_env("CLOUDINARY_API_SECRET");

        match (cloud_name, api_key, api_secret) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => {
                if let Err(e) = validate_secret_strength(&api_secret, "CLOUDINARY_API_SECRET") {
                    tracing::warn!("CLOUDINARY_API_SECRET validation warning: {e}");
                }
                Ok(Some(Self {
                    cloud_name,
                    api_key,
                    api_secret: SecretString::from(api_secret),
                    folder: get_env_or_default("CLOUDINARY_FOLDER", "dokan"),
                }))
            }
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "CLOUDINARY_*".to_string(),
                "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set together"
                    .to_string(),
            )),
        }
    }
}

/// Sentry error tracking settings.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env("SENTRY_SAMPLE_RATE", 1.0)?,
            traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
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

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = parse_env("ADMIN_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_env("ADMIN_PORT", 3001_u16)?;
        let base_url = get_required_env("ADMIN_BASE_URL")?
            .trim_end_matches('/')
            .to_string();

        let ttl_hours = parse_env("ADMIN_TOKEN_TTL_HOURS", 24_i64)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&ttl_hours) {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_TOKEN_TTL_HOURS".to_string(),
                format!("must be between 1 and {MAX_TOKEN_TTL_HOURS}"),
            ));
        }
        let jwt = JwtConfig {
            secret: get_validated_secret("ADMIN_JWT_SECRET")?,
            ttl_hours,
        };

        let cors_allowed_origins = get_optional_env("CORS_ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        let uploads = UploadConfig {
            dir: PathBuf::from(get_env_or_default("UPLOAD_DIR", "uploads")),
            public_url: get_optional_env("UPLOAD_PUBLIC_URL")
                .map_or_else(|| format!("{base_url}/uploads"), |u| {
                    u.trim_end_matches('/').to_string()
                }),
            cloudinary: CloudinaryConfig::from_env()?,
        };

        let sync_secs = parse_env("COURIER_SYNC_INTERVAL_SECS", 0_u64)?;
        let courier_sync_interval = (sync_secs > 0).then(|| Duration::from_secs(sync_secs));

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            jwt,
            cors_allowed_origins,
            uploads,
            courier_sync_interval,
            low_stock_threshold: parse_env("LOW_STOCK_THRESHOLD", 5_i32)?,
            store_name: get_env_or_default("STORE_NAME", "Dokan"),
            receipt_font_path: get_optional_env("RECEIPT_FONT_PATH").map(PathBuf::from),
            json_logs: get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            sentry: SentryConfig::from_env()?,
            tls: TlsConfig::from_env()?,
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
        self.tls.is_some() || self.base_url.starts_with("https://")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config() -> AdminConfig {
        AdminConfig {
            database_url: SecretString::from("postgres://localhost/dokan_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            jwt: JwtConfig {
                secret: SecretString::from("k8#Qz!v2Lw9@pR4t^Yx7&Nm3*Bc6$Hd1"),
                ttl_hours: 24,
            },
            cors_allowed_origins: vec!["http://localhost:5174".to_string()],
            uploads: UploadConfig {
                dir: PathBuf::from("uploads"),
                public_url: "http://localhost:3001/uploads".to_string(),
                cloudinary: None,
            },
            courier_sync_interval: None,
            low_stock_threshold: 5,
            store_name: "Dokan".to_string(),
            receipt_font_path: None,
            json_logs: false,
            sentry: SentryConfig {
                dsn: None,
                environment: None,
                sample_rate: 1.0,
                traces_sample_rate: 0.0,
            },
            tls: None,
        }
    }

    #[test]
    fn test_is_secure() {
        let mut config = test_config();
        assert!(!config.is_secure());
        config.base_url = "https://admin.dokan.com.bd".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = test_config();
        config.uploads.cloudinary = Some(CloudinaryConfig {
            cloud_name: "dokan".to_string(),
            api_key: "123456".to_string(),
            api_secret: SecretString::from("cloudinary-api-secret-value"),
            folder: "dokan".to_string(),
        });
        let debug = format!("{config:?}");
        assert!(!debug.contains("k8#Qz"));
        assert!(!debug.contains("cloudinary-api-secret-value"));
        assert!(debug.contains("[REDACTED]"));
    }
}
