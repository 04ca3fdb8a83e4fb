//! Domain models persisted by the repositories in [`crate::db`].
//!
//! These are validated domain objects, separate from the internal row types
//! the repositories decode.

pub mod admin_user;
pub mod catalog;
pub mod content;
pub mod courier;
pub mod customer;
pub mod order;

use serde::Serialize;

pub use admin_user::{AdminLogin, AdminUser};
pub use catalog::{
    Category, CategoryInput, CategorySummary, Product, ProductFilter, ProductInput, ProductSort,
};
pub use content::{Footer, FooterInput, FooterLink, NavbarItem, NavbarItemInput, SocialLink};
pub use courier::{CourierSetting, CourierSettingInput, mask_secret};
pub use customer::{Customer, GoogleProfile, ProfileUpdate};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderDetailsUpdate, OrderFilter, OrderItem, OrderStats,
};

/// Largest page size any list endpoint will serve.
pub const MAX_PER_PAGE: i64 = 100;

/// Highest page number accepted; larger requests read past the end anyway.
pub const MAX_PAGE: i64 = 1_000_000;

/// Page size used when the client does not ask for one.
pub const DEFAULT_PER_PAGE: i64 = 20;

/// One page of a list query.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Build a page, deriving `total_pages` from `total` and `per_page`.
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }

    /// Transform the items while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Clamp client paging input to `1 <= page <= MAX_PAGE` and
/// `1 <= per_page <= 100`.
#[must_use]
pub fn clamp_paging(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    (page, per_page)
}

/// Row offset for a page. Never negative and never overflows, even for
/// unclamped input.
#[must_use]
pub const fn page_offset(page: i64, per_page: i64) -> i64 {
    let offset = page.saturating_sub(1).saturating_mul(per_page);
    if offset < 0 { 0 } else { offset }
}
