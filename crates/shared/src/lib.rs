//! Shared building blocks for the Dokan storefront and admin services.
//!
//! - [`config`]: environment lookups and secret validation
//! - [`models`]: domain models returned by the repositories
//! - [`db`]: PostgreSQL repositories and embedded migrations
//! - [`receipt`]: PDF order receipts
//! - [`request_id`]: request ID middleware for both servers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod models;
pub mod receipt;
pub mod request_id;
