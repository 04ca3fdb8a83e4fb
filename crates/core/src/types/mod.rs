//! Core types for Dokan.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod order_number;
pub mod phone;
pub mod status;
pub mod text;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError, discount_percentage, effective_price};
pub use order_number::format_order_number;
pub use phone::{PhoneError, PhoneNumber};
pub use status::*;
pub use text::{Language, LocalizedText, slugify};
