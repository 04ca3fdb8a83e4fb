//! Courier account credentials.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use dokan_core::{CourierProvider, CourierSettingId};

/// Stored credentials for one courier account.
///
/// Implements `Debug` manually to redact the keys.
#[derive(Clone)]
pub struct CourierSetting {
    pub id: CourierSettingId,
    pub provider: CourierProvider,
    pub name: String,
    pub api_key: SecretString,
    pub secret_key: SecretString,
    /// Overrides the provider's default API base URL.
    pub base_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for CourierSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourierSetting")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("name", &self.name)
            .field("api_key", &mask_secret(self.api_key.expose_secret()))
            .field("secret_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

/// Fields for creating or updating a courier account.
///
/// On update, `None` keys keep the stored value.
#[derive(Clone)]
pub struct CourierSettingInput {
    pub provider: CourierProvider,
    pub name: String,
    pub api_key: Option<SecretString>,
    pub secret_key: Option<SecretString>,
    pub base_url: Option<String>,
}

/// Show only the last four characters of a credential.
///
/// ```
/// use dokan_shared::models::mask_secret;
///
/// assert_eq!(mask_secret("abcd1234wxyz"), "********wxyz");
/// assert_eq!(mask_secret("abc"), "***");
/// ```
#[must_use]
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars.iter().skip(chars.len() - 4).collect();
    format!("{}{visible}", "*".repeat(chars.len() - 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("1234"), "****");
        assert_eq!(mask_secret("12345"), "*2345");
    }

    #[test]
    fn test_debug_redacts_keys() {
        let setting = CourierSetting {
            id: CourierSettingId::new(1),
            provider: CourierProvider::Steadfast,
            name: "Main account".to_string(),
            api_key: SecretString::from("live-api-key-98765"),
            secret_key: SecretString::from("live-secret-key-abcde"),
            base_url: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let debug = format!("{setting:?}");
        assert!(debug.contains("8765"));
        assert!(!debug.contains("live-api-key"));
        assert!(!debug.contains("live-secret-key-abcde"));
    }
}
