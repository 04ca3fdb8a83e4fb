//! Dokan Core - Shared domain types.
//!
//! This crate provides the types used across all Dokan components:
//! - `storefront` - Public JSON API backing the customer-facing site
//! - `admin` - Back-office JSON API backing the admin panel
//! - `cli` - Command-line tools for migrations, admin accounts and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Database encode/decode support for the
//! id newtypes is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe ids, emails, phone numbers, money, bilingual text
//!   and the order/courier status vocabularies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
