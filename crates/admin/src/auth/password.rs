//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$...`), which carry
//! their own salt and parameters.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::LazyLock;

use thiserror::Error;

/// Shortest password accepted for an admin account.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest password accepted (bounds hashing cost).
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Errors from hashing or checking passwords.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    InvalidHash(String),

    #[error("password must be between {min} and {max} characters")]
    Length { min: usize, max: usize },
}

/// Argon2id with 19 MiB memory, 2 passes and 1 lane.
fn argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(19 * 1024, 2, 1, Some(32))
        .map_err(|e| PasswordError::Hash(format!("invalid parameters: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Check a new password's length.
///
/// # Errors
///
/// Returns `PasswordError::Length` when out of range.
pub fn validate_new_password(password: &str) -> Result<(), PasswordError> {
    let len = password.chars().count();
    if (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len) {
        Ok(())
    } else {
        Err(PasswordError::Length {
            min: MIN_PASSWORD_LENGTH,
            max: MAX_PASSWORD_LENGTH,
        })
    }
}

/// Hash a password with a fresh random salt.
///
/// # Errors
///
/// Returns `PasswordError::Hash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a password against a stored hash.
///
/// Returns `Ok(false)` for a wrong password.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match argon2()?.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::InvalidHash(e.to_string())),
    }
}

/// Hash of a random password, checked when no account matches so a failed
/// login costs the same with or without a known email.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let password = SaltString::generate(&mut OsRng);
    hash_password(password.as_str()).ok()
});

/// Run a full password check against a throwaway hash. Always `false`.
#[must_use]
pub fn verify_against_dummy(password: &str) -> bool {
    DUMMY_HASH
        .as_deref()
        .is_some_and(|hash| verify_password(password, hash).unwrap_or(false))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("shonar-bangla-71").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("shonar-bangla-71", &hash).unwrap());
        assert!(!verify_password("shonar-bangla-72", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salts() {
        let a = hash_password("padma-bridge").unwrap();
        let b = hash_password("padma-bridge").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dummy_check_runs_argon2_and_fails() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        assert!(PasswordHash::new(hash).is_ok());
        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_against_dummy("shonar-bangla-71"));
        assert!(!verify_against_dummy(""));
    }

    #[test]
    fn test_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("1234567").is_err());
        assert!(validate_new_password("12345678").is_ok());
        assert!(validate_new_password(&"x".repeat(129)).is_err());
    }
}
