//! HTTP middleware and extractors for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. CORS (frontend origins, credentials allowed)
//! 3. `TraceLayer` (request span with status and latency)
//! 4. Request ID (stamped into the span, Sentry scope and response)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting on auth and checkout routes (governor)

pub mod auth;
pub mod language;
pub mod rate_limit;
pub mod session;

pub use dokan_shared::request_id::{REQUEST_ID_HEADER, request_id_middleware};

pub use auth::{OptionalCustomer, RequireCustomer, clear_current_customer, set_current_customer};
pub use language::Lang;
pub use rate_limit::{auth_rate_limiter, checkout_rate_limiter};
pub use session::create_session_layer;
