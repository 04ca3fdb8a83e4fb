//! Navbar and footer content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dokan_core::{LocalizedText, NavbarItemId};

/// A top navigation link.
#[derive(Debug, Clone, Serialize)]
pub struct NavbarItem {
    pub id: NavbarItemId,
    pub label: LocalizedText,
    pub url: String,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating or replacing a navbar item.
#[derive(Debug, Clone, Deserialize)]
pub struct NavbarItemInput {
    pub label: LocalizedText,
    pub url: String,
    /// Appended after the last item when omitted.
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl NavbarItemInput {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for the first failed rule.
    pub fn validate(&self) -> Result<(), String> {
        if self.label.en.trim().is_empty() {
            return Err("Navbar label (English) is required".to_string());
        }
        if self.url.trim().is_empty() {
            return Err("Navbar URL is required".to_string());
        }
        Ok(())
    }
}

/// A footer link with a bilingual label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterLink {
    pub label: LocalizedText,
    pub url: String,
}

/// A social network profile link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

/// The site footer (a single record).
#[derive(Debug, Clone, Serialize)]
pub struct Footer {
    pub about: LocalizedText,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub quick_links: Vec<FooterLink>,
    pub social_links: Vec<SocialLink>,
    pub copyright_text: String,
    pub updated_at: DateTime<Utc>,
}

/// Replacement footer content.
#[derive(Debug, Clone, Deserialize)]
pub struct FooterInput {
    #[serde(default)]
    pub about: LocalizedText,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub quick_links: Vec<FooterLink>,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
    #[serde(default)]
    pub copyright_text: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_navbar_input_defaults() {
        let input: NavbarItemInput =
            serde_json::from_str(r#"{"label":{"en":"Shop","bn":"শপ"},"url":"/shop"}"#).unwrap();
        assert!(input.is_active);
        assert_eq!(input.position, None);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_navbar_input_requires_url() {
        let input: NavbarItemInput =
            serde_json::from_str(r#"{"label":{"en":"Shop"},"url":"  "}"#).unwrap();
        assert_eq!(input.validate().unwrap_err(), "Navbar URL is required");
    }

    #[test]
    fn test_footer_input_all_optional() {
        let input: FooterInput = serde_json::from_str("{}").unwrap();
        assert!(input.quick_links.is_empty());
        assert!(input.about.is_blank());
    }
}
