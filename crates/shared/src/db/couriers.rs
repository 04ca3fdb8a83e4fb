//! Courier credential repository.
//!
//! At most one account is active at a time. Activation runs in a
//! transaction, and the partial unique index on `is_active` rejects any
//! interleaving that would leave two active rows.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use dokan_core::CourierSettingId;

use super::{RepositoryError, parse_column};
use crate::models::{CourierSetting, CourierSettingInput};

#[derive(sqlx::FromRow)]
struct CourierSettingRow {
    id: i32,
    provider: String,
    name: String,
    api_key: String,
    secret_key: String,
    base_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CourierSettingRow> for CourierSetting {
    type Error = RepositoryError;

    fn try_from(row: CourierSettingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CourierSettingId::new(row.id),
            provider: parse_column(&row.provider, "provider")?,
            name: row.name,
            api_key: SecretString::from(row.api_key),
            secret_key: SecretString::from(row.secret_key),
            base_url: row.base_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COLUMNS: &str =
    "id, provider, name, api_key, secret_key, base_url, is_active, created_at, updated_at";

/// Repository for courier account credentials.
pub struct CourierSettingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CourierSettingRepository<'a> {
    /// Create a new courier setting repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all courier accounts, active first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored provider is unknown.
    pub async fn list(&self) -> Result<Vec<CourierSetting>, RepositoryError> {
        let rows = sqlx::query_as::<_, CourierSettingRow>(&format!(
            "SELECT {COLUMNS} FROM shop.courier_setting ORDER BY is_active DESC, id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a courier account by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored provider is unknown.
    pub async fn get(&self, id: CourierSettingId) -> Result<Option<CourierSetting>, RepositoryError> {
        let row = sqlx::query_as::<_, CourierSettingRow>(&format!(
            "SELECT {COLUMNS} FROM shop.courier_setting WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// The active courier account, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored provider is unknown.
    pub async fn get_active(&self) -> Result<Option<CourierSetting>, RepositoryError> {
        let row = sqlx::query_as::<_, CourierSettingRow>(&format!(
            "SELECT {COLUMNS} FROM shop.courier_setting WHERE is_active"
        ))
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create an inactive courier account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if either key is missing.
    pub async fn create(
        &self,
        input: &CourierSettingInput,
    ) -> Result<CourierSetting, RepositoryError> {
        let (Some(api_key), Some(secret_key)) = (&input.api_key, &input.secret_key) else {
            return Err(RepositoryError::Conflict(
                "api key and secret key are required".to_owned(),
            ));
        };

        let row = sqlx::query_as::<_, CourierSettingRow>(&format!(
            "INSERT INTO shop.courier_setting (provider, name, api_key, secret_key, base_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        ))
        .bind(input.provider.as_str())
        .bind(input.name.trim())
        .bind(api_key.expose_secret())
        .bind(secret_key.expose_secret())
        .bind(input.base_url.as_deref())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Update a courier account. Keys left as `None` are kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn update(
        &self,
        id: CourierSettingId,
        input: &CourierSettingInput,
    ) -> Result<CourierSetting, RepositoryError> {
        let row = sqlx::query_as::<_, CourierSettingRow>(&format!(
            "UPDATE shop.courier_setting
             SET provider = $2, name = $3,
                 api_key = COALESCE($4, api_key), secret_key = COALESCE($5, secret_key),
                 base_url = $6, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(input.provider.as_str())
        .bind(input.name.trim())
        .bind(input.api_key.as_ref().map(|k| k.expose_secret()))
        .bind(input.secret_key.as_ref().map(|k| k.expose_secret()))
        .bind(input.base_url.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a courier account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn delete(&self, id: CourierSettingId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM shop.courier_setting WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Make `id` the only active courier account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist
    /// (nothing is deactivated in that case).
    pub async fn set_active(
        &self,
        id: CourierSettingId,
    ) -> Result<CourierSetting, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE shop.courier_setting SET is_active = false, updated_at = now()
             WHERE is_active AND id <> $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, CourierSettingRow>(&format!(
            "UPDATE shop.courier_setting SET is_active = true, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            RepositoryError::from_constraint(e, "another courier account was activated concurrently")
        })?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };

        tx.commit().await?;
        row.try_into()
    }

    /// Deactivate a courier account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn deactivate(
        &self,
        id: CourierSettingId,
    ) -> Result<CourierSetting, RepositoryError> {
        let row = sqlx::query_as::<_, CourierSettingRow>(&format!(
            "UPDATE shop.courier_setting SET is_active = false, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }
}
