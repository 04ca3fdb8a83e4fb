//! External service clients for the storefront.
//!
//! - `google` - Google OAuth 2.0 sign-in for customers

pub mod google;

pub use google::{GoogleAuthError, GoogleClient};
