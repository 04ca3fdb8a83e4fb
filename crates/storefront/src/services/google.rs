//! Google OAuth 2.0 client for customer sign-in.
//!
//! # Flow
//!
//! 1. Generate the consent URL with [`GoogleClient::authorization_url`]
//! 2. Google redirects back with an authorization code
//! 3. Exchange it with [`GoogleClient::exchange_code`]
//! 4. Fetch the signed-in identity with [`GoogleClient::fetch_profile`]

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use dokan_core::Email;
use dokan_shared::models::GoogleProfile;

use crate::config::GoogleConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Errors from the Google OAuth exchange.
#[derive(Debug, Error)]
pub enum GoogleAuthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Google rejected the authorization code.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The userinfo request failed.
    #[error("profile request failed: {0}")]
    Profile(String),

    /// Google has not verified the account's email address.
    #[error("email address is not verified")]
    UnverifiedEmail,

    /// Google returned an email we cannot parse.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] dokan_core::EmailError),
}

impl GoogleAuthError {
    /// Short code passed to the frontend in `?error=`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Http(_) | Self::TokenExchange(_) => "token_exchange",
            Self::Profile(_) => "profile",
            Self::UnverifiedEmail | Self::InvalidEmail(_) => "email",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: String,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl UserInfo {
    fn into_profile(self) -> Result<GoogleProfile, GoogleAuthError> {
        if !self.email_verified {
            return Err(GoogleAuthError::UnverifiedEmail);
        }
        let email = Email::parse(&self.email)?;
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.local_part().to_string());

        Ok(GoogleProfile {
            google_id: self.sub,
            email,
            name,
            avatar_url: self.picture,
        })
    }
}

/// Client for Google's OAuth and userinfo endpoints.
#[derive(Clone)]
pub struct GoogleClient {
    inner: Arc<GoogleClientInner>,
}

struct GoogleClientInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
}

impl GoogleClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GoogleConfig) -> Result<Self, GoogleAuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            inner: Arc::new(GoogleClientInner {
                client,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
            }),
        })
    }

    /// Build the consent screen URL.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        let mut url = match Url::parse(AUTHORIZE_URL) {
            Ok(url) => url,
            Err(_) => return AUTHORIZE_URL.to_string(),
        };
        url.query_pairs_mut()
            .append_pair("client_id", &self.inner.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state)
            .append_pair("prompt", "select_account");
        url.into()
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Google rejects the code.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, GoogleAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self.inner.client.post(TOKEN_URL).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GoogleAuthError::TokenExchange(format!("{status}: {text}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Fetch the signed-in user's identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the email is unverified.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, GoogleAuthError> {
        let response = self
            .inner
            .client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GoogleAuthError::Profile(format!("status {status}")));
        }

        let info: UserInfo = response.json().await?;
        info.into_profile()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> GoogleClient {
        GoogleClient::new(&GoogleConfig {
            client_id: "abc.apps.googleusercontent.com".to_string(),
            client_secret: SecretString::from("s3cr3t"),
        })
        .unwrap()
    }

    #[test]
    fn test_authorization_url_encodes_params() {
        let url = client().authorization_url("http://localhost:3000/auth/google/callback", "st@te");
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(pairs.contains(&("state".to_string(), "st@te".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "http://localhost:3000/auth/google/callback".to_string()
        )));
        assert!(pairs.contains(&("scope".to_string(), "openid email profile".to_string())));
        assert!(!url.contains("s3cr3t"));
    }

    #[test]
    fn test_userinfo_into_profile() {
        let info: UserInfo = serde_json::from_str(
            r#"{"sub":"1098","email":"Rahim@Example.com","email_verified":true,"picture":"https://lh3/x.png"}"#,
        )
        .unwrap();
        let profile = info.into_profile().unwrap();
        assert_eq!(profile.google_id, "1098");
        assert_eq!(profile.email.as_str(), "rahim@example.com");
        assert_eq!(profile.name, "rahim");
    }

    #[test]
    fn test_unverified_email_rejected() {
        let info: UserInfo =
            serde_json::from_str(r#"{"sub":"1","email":"a@b.com","email_verified":false}"#).unwrap();
        assert!(matches!(
            info.into_profile(),
            Err(GoogleAuthError::UnverifiedEmail)
        ));
    }
}
