//! Signed admin session tokens.
//!
//! Tokens are HS256 JWTs carrying the admin's id, email and role. They are
//! handed out on login both as an `HttpOnly` cookie and in the response
//! body, so browser and scripted clients can use the same endpoints.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dokan_core::{AdminRole, AdminUserId};
use dokan_shared::models::AdminUser;

/// Issuer written into and required of every token.
pub const ISSUER: &str = "dokan-admin";

/// Errors from issuing or checking tokens.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("failed to create token: {0}")]
    Create(String),

    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Claims carried by an admin token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Admin user id
    pub sub: i32,
    pub email: String,
    pub role: AdminRole,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims for `admin`, valid for `ttl` from now.
    #[must_use]
    pub fn for_admin(admin: &AdminUser, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: admin.id.as_i32(),
            email: admin.email.as_str().to_string(),
            role: admin.role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    #[must_use]
    pub const fn admin_id(&self) -> AdminUserId {
        AdminUserId::new(self.sub)
    }
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtKeys {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_hours: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Token lifetime, also used as the cookie `Max-Age`.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `admin`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Create` if encoding fails.
    pub fn issue(&self, admin: &AdminUser) -> Result<String, JwtError> {
        let claims = Claims::for_admin(admin, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::Create(e.to_string()))
    }

    /// Verify signature, expiry and issuer, and return the claims.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` for expired tokens and
    /// `JwtError::Invalid` for anything else wrong with the token.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 30;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dokan_core::Email;

    use super::*;

    fn admin() -> AdminUser {
        AdminUser {
            id: AdminUserId::new(7),
            email: Email::parse("rahim@dokan.com.bd").unwrap(),
            name: "Rahim Uddin".to_string(),
            role: AdminRole::SuperAdmin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&SecretString::from(secret), 24)
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = keys("k8#Qz!v2Lw9@pR4t^Yx7&Nm3*Bc6$Hd1");
        let token = keys.issue(&admin()).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.admin_id(), AdminUserId::new(7));
        assert_eq!(claims.role, AdminRole::SuperAdmin);
        assert_eq!(claims.email, "rahim@dokan.com.bd");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = keys("k8#Qz!v2Lw9@pR4t^Yx7&Nm3*Bc6$Hd1").issue(&admin()).unwrap();
        let result = keys("a-completely-different-secret-value!").verify(&token);
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_expired_rejected() {
        let keys = keys("k8#Qz!v2Lw9@pR4t^Yx7&Nm3*Bc6$Hd1");
        let claims = Claims::for_admin(&admin(), Duration::hours(-2));
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
        assert!(matches!(keys.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_garbage_rejected() {
        let keys = keys("k8#Qz!v2Lw9@pR4t^Yx7&Nm3*Bc6$Hd1");
        assert!(matches!(keys.verify("not.a.token"), Err(JwtError::Invalid(_))));
    }
}
