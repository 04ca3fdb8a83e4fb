//! Command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

use dokan_shared::config::{ConfigError, get_database_url};
use dokan_shared::db::{self, RepositoryError};

/// Errors shared by every command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Invalid(String),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Database URL for CLI commands: `ADMIN_DATABASE_URL`, then `DATABASE_URL`.
fn database_url() -> Result<SecretString, ConfigError> {
    dotenvy::dotenv().ok();
    get_database_url("ADMIN_DATABASE_URL")
}

/// Connect to the configured database.
pub async fn connect() -> Result<PgPool, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}
