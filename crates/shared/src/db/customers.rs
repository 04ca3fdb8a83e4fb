//! Storefront customer repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dokan_core::{CustomerId, Email, PhoneNumber};

use super::RepositoryError;
use crate::models::{Customer, GoogleProfile, ProfileUpdate};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    google_id: Option<String>,
    email: String,
    name: String,
    avatar_url: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let phone = row
            .phone
            .as_deref()
            .map(PhoneNumber::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid phone in database: {e}")))?;

        Ok(Self {
            id: CustomerId::new(row.id),
            google_id: row.google_id,
            email,
            name: row.name,
            avatar_url: row.avatar_url,
            phone,
            address: row.address,
            created_at: row.created_at,
        })
    }
}

const COLUMNS: &str = "id, google_id, email, name, avatar_url, phone, address, created_at";

/// Repository for storefront customers.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {COLUMNS} FROM shop.customer WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Find or create the customer for a Google sign-in.
    ///
    /// Matches on Google account ID first, then links an existing customer
    /// with the same email, otherwise inserts a new one. Name and avatar are
    /// refreshed from Google each time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email belongs to a
    /// different Google account.
    pub async fn upsert_google(&self, profile: &GoogleProfile) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "UPDATE shop.customer
             SET email = $2, name = $3, avatar_url = $4, updated_at = now()
             WHERE google_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(&profile.google_id)
        .bind(profile.email.as_str())
        .bind(&profile.name)
        .bind(profile.avatar_url.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "email already linked to another account"))?;

        if let Some(row) = row {
            return row.try_into();
        }

        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "INSERT INTO shop.customer (google_id, email, name, avatar_url)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO UPDATE SET
                google_id = EXCLUDED.google_id,
                name = EXCLUDED.name,
                avatar_url = EXCLUDED.avatar_url,
                updated_at = now()
             WHERE shop.customer.google_id IS NULL
             RETURNING {COLUMNS}"
        ))
        .bind(&profile.google_id)
        .bind(profile.email.as_str())
        .bind(&profile.name)
        .bind(profile.avatar_url.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()?.ok_or_else(|| {
            RepositoryError::Conflict("email already linked to another account".to_owned())
        })
    }

    /// Update the editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    pub async fn update_profile(
        &self,
        id: CustomerId,
        update: &ProfileUpdate,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "UPDATE shop.customer
             SET name = $2, phone = $3, address = $4, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(update.name.trim())
        .bind(update.phone.as_ref().map(PhoneNumber::as_str))
        .bind(update.address.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }
}
