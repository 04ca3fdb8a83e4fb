//! Steadfast courier API client.
//!
//! Steadfast (Packzy) is the courier Dokan hands parcels to. The API is a
//! small REST surface authenticated with an `Api-Key`/`Secret-Key` header
//! pair taken from the active courier setting.
//!
//! # Error model
//!
//! Steadfast answers most failures with HTTP 200 and a `status` field in
//! the JSON body, so the client checks both. Credentials problems come back
//! as 401/403, throttling as 429.

pub mod client;
pub mod types;

pub use client::{StatusLookup, SteadfastClient};
pub use types::*;

use thiserror::Error;

/// Default production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://portal.packzy.com/api/v1";

/// Errors that can occur when talking to Steadfast.
#[derive(Debug, Error)]
pub enum SteadfastError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Steadfast rejected the request.
    #[error("Steadfast API error ({status}): {message}")]
    Api { status: i64, message: String },

    /// Response body was not what we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// API key or secret key rejected.
    #[error("Steadfast rejected the API credentials")]
    Unauthorized,

    /// Rate limited by Steadfast.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The order cannot be sent as it is.
    #[error("{0}")]
    InvalidRequest(String),
}

impl SteadfastError {
    /// Whether Steadfast reported the reference as unknown.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
