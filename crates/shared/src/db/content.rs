//! Navbar and footer repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use dokan_core::{LocalizedText, NavbarItemId};

use super::RepositoryError;
use crate::models::{Footer, FooterInput, FooterLink, NavbarItem, NavbarItemInput, SocialLink};

#[derive(Debug, sqlx::FromRow)]
struct NavbarRow {
    id: i32,
    label_en: String,
    label_bn: String,
    url: String,
    position: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<NavbarRow> for NavbarItem {
    fn from(row: NavbarRow) -> Self {
        Self {
            id: NavbarItemId::new(row.id),
            label: LocalizedText::new(row.label_en, row.label_bn),
            url: row.url,
            position: row.position,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FooterRow {
    about_en: String,
    about_bn: String,
    address: String,
    phone: String,
    email: String,
    quick_links: Json<Vec<FooterLink>>,
    social_links: Json<Vec<SocialLink>>,
    copyright_text: String,
    updated_at: DateTime<Utc>,
}

impl From<FooterRow> for Footer {
    fn from(row: FooterRow) -> Self {
        Self {
            about: LocalizedText::new(row.about_en, row.about_bn),
            address: row.address,
            phone: row.phone,
            email: row.email,
            quick_links: row.quick_links.0,
            social_links: row.social_links.0,
            copyright_text: row.copyright_text,
            updated_at: row.updated_at,
        }
    }
}

const NAVBAR_COLUMNS: &str =
    "id, label_en, label_bn, url, position, is_active, created_at, updated_at";

const FOOTER_COLUMNS: &str = "about_en, about_bn, address, phone, email, quick_links, \
                              social_links, copyright_text, updated_at";

/// Repository for navbar and footer content.
pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    /// Create a new content repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Navbar items by position; only active ones when `active_only`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_navbar(&self, active_only: bool) -> Result<Vec<NavbarItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, NavbarRow>(&format!(
            "SELECT {NAVBAR_COLUMNS} FROM shop.navbar_item
             WHERE (NOT $1 OR is_active)
             ORDER BY position, id"
        ))
        .bind(active_only)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add a navbar item, at the end unless a position is given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_navbar_item(
        &self,
        input: &NavbarItemInput,
    ) -> Result<NavbarItem, RepositoryError> {
        let row = sqlx::query_as::<_, NavbarRow>(&format!(
            "INSERT INTO shop.navbar_item (label_en, label_bn, url, position, is_active)
             VALUES ($1, $2, $3,
                     COALESCE($4, (SELECT COALESCE(MAX(position) + 1, 0) FROM shop.navbar_item)),
                     $5)
             RETURNING {NAVBAR_COLUMNS}"
        ))
        .bind(input.label.en.trim())
        .bind(input.label.bn.trim())
        .bind(input.url.trim())
        .bind(input.position)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace a navbar item. A missing position keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn update_navbar_item(
        &self,
        id: NavbarItemId,
        input: &NavbarItemInput,
    ) -> Result<NavbarItem, RepositoryError> {
        let row = sqlx::query_as::<_, NavbarRow>(&format!(
            "UPDATE shop.navbar_item
             SET label_en = $2, label_bn = $3, url = $4,
                 position = COALESCE($5, position), is_active = $6, updated_at = now()
             WHERE id = $1
             RETURNING {NAVBAR_COLUMNS}"
        ))
        .bind(id)
        .bind(input.label.en.trim())
        .bind(input.label.bn.trim())
        .bind(input.url.trim())
        .bind(input.position)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a navbar item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn delete_navbar_item(&self, id: NavbarItemId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM shop.navbar_item WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Renumber navbar items in the given order (0, 1, 2, ...).
    ///
    /// Items not listed keep their positions after the listed ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if any listed item does not exist;
    /// nothing is changed in that case.
    pub async fn reorder_navbar(
        &self,
        ordered: &[NavbarItemId],
    ) -> Result<Vec<NavbarItem>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let listed = i32::try_from(ordered.len())
            .map_err(|_| RepositoryError::Conflict("too many navbar items".to_owned()))?;

        for (position, id) in (0..).zip(ordered) {
            let updated = sqlx::query(
                "UPDATE shop.navbar_item SET position = $2, updated_at = now() WHERE id = $1",
            )
            .bind(*id)
            .bind(position)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
        }

        let ids: Vec<i32> = ordered.iter().map(NavbarItemId::as_i32).collect();
        sqlx::query(
            "UPDATE shop.navbar_item SET position = position + $2
             WHERE NOT (id = ANY($1))",
        )
        .bind(&ids)
        .bind(listed)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.list_navbar(false).await
    }

    /// The footer, if it has ever been saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_footer(&self) -> Result<Option<Footer>, RepositoryError> {
        let row = sqlx::query_as::<_, FooterRow>(&format!(
            "SELECT {FOOTER_COLUMNS} FROM shop.footer WHERE id = 1"
        ))
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create or replace the footer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_footer(&self, input: &FooterInput) -> Result<Footer, RepositoryError> {
        let row = sqlx::query_as::<_, FooterRow>(&format!(
            "INSERT INTO shop.footer
                (id, about_en, about_bn, address, phone, email, quick_links, social_links,
                 copyright_text, updated_at)
             VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, now())
             ON CONFLICT (id) DO UPDATE SET
                about_en = EXCLUDED.about_en, about_bn = EXCLUDED.about_bn,
                address = EXCLUDED.address, phone = EXCLUDED.phone, email = EXCLUDED.email,
                quick_links = EXCLUDED.quick_links, social_links = EXCLUDED.social_links,
                copyright_text = EXCLUDED.copyright_text, updated_at = now()
             RETURNING {FOOTER_COLUMNS}"
        ))
        .bind(input.about.en.trim())
        .bind(input.about.bn.trim())
        .bind(input.address.trim())
        .bind(input.phone.trim())
        .bind(input.email.trim())
        .bind(Json(&input.quick_links))
        .bind(Json(&input.social_links))
        .bind(input.copyright_text.trim())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
