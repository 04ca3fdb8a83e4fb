//! Storefront customer accounts (Google sign-in).

use chrono::{DateTime, Utc};
use serde::Serialize;

use dokan_core::{CustomerId, Email, PhoneNumber};

/// A signed-in storefront customer.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(skip)]
    pub google_id: Option<String>,
    pub email: Email,
    pub name: String,
    pub avatar_url: Option<String>,
    pub phone: Option<PhoneNumber>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Identity returned by Google's userinfo endpoint.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub google_id: String,
    pub email: Email,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Editable profile fields.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: Option<PhoneNumber>,
    pub address: Option<String>,
}
