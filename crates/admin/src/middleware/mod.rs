//! HTTP middleware and extractors for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. CORS (admin frontend origins, credentials allowed)
//! 3. `TraceLayer` (request span with status and latency)
//! 4. Request ID (stamped into the span, Sentry scope and response)
//!
//! `POST /admin/login` additionally sits behind [`login_rate_limiter`].
//!
//! Authentication is not a layer: handlers opt in through the
//! [`RequireAdmin`] and [`RequireSuperAdmin`] extractors.

pub mod auth;
pub mod rate_limit;

pub use dokan_shared::request_id::{REQUEST_ID_HEADER, request_id_middleware};

pub use auth::{RequireAdmin, RequireSuperAdmin};
pub use rate_limit::login_rate_limiter;
