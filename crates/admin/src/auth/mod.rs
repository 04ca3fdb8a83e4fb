//! Admin authentication: password hashing and signed session tokens.

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtError, JwtKeys};
pub use password::{
    PasswordError, hash_password, validate_new_password, verify_against_dummy, verify_password,
};
