//! Categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dokan_core::{CategoryId, LocalizedText, ProductId, discount_percentage, effective_price};

/// A product category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: LocalizedText,
    pub slug: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The category fields embedded in product responses.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: LocalizedText,
    pub slug: String,
}

/// Fields for creating or replacing a category.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: LocalizedText,
    pub slug: String,
    pub image_url: Option<String>,
}

impl CategoryInput {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for the first failed rule.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.en.trim().is_empty() {
            return Err("Category name (English) is required".to_string());
        }
        if self.slug.trim().is_empty() {
            return Err("Category slug cannot be empty".to_string());
        }
        Ok(())
    }
}

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub category: Option<CategorySummary>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub stock: i32,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Rounded percentage off, when discounted.
    #[must_use]
    pub fn discount_percentage(&self) -> Option<u8> {
        discount_percentage(self.price, self.discount_price)
    }

    /// Unit price a customer pays today.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        effective_price(self.price, self.discount_price)
    }

    /// Whether `quantity` units can be sold right now.
    #[must_use]
    pub fn can_fulfil(&self, quantity: i32) -> bool {
        self.is_active && quantity > 0 && self.stock >= quantity
    }

    /// First image, used as the thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Fields for creating or replacing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub category_id: Option<CategoryId>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub stock: i32,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub is_featured: bool,
    pub is_active: bool,
}

impl ProductInput {
    /// Check prices, stock and names.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for the first failed rule.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.en.trim().is_empty() {
            return Err("Product name (English) is required".to_string());
        }
        if self.price <= Decimal::ZERO {
            return Err("Price must be greater than zero".to_string());
        }
        if let Some(discount) = self.discount_price {
            if discount.is_sign_negative() {
                return Err("Discount price cannot be negative".to_string());
            }
            if discount >= self.price {
                return Err("Discount price must be lower than the price".to_string());
            }
        }
        if self.stock < 0 {
            return Err("Stock cannot be negative".to_string());
        }
        Ok(())
    }
}

/// Product list ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    /// SQL `ORDER BY` body for this sort. Prices sort on the effective price.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC",
            Self::PriceAsc => "LEAST(COALESCE(p.discount_price, p.price), p.price) ASC, p.id ASC",
            Self::PriceDesc => "LEAST(COALESCE(p.discount_price, p.price), p.price) DESC, p.id DESC",
            Self::Name => "lower(p.name_en) ASC, p.id ASC",
        }
    }
}

/// Product list filter. Paging values are expected to be clamped already.
#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub category_slug: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub active_only: bool,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub exclude: Option<ProductId>,
    pub sort: ProductSort,
    pub page: i64,
    pub per_page: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category_id: None,
            category_slug: None,
            search: None,
            featured: None,
            active_only: true,
            min_price: None,
            max_price: None,
            exclude: None,
            sort: ProductSort::Newest,
            page: 1,
            per_page: super::DEFAULT_PER_PAGE,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        ProductInput {
            name: LocalizedText::new("Cotton Panjabi", "সুতি পাঞ্জাবি"),
            description: LocalizedText::default(),
            category_id: None,
            price: Decimal::from(1500),
            discount_price: Some(Decimal::from(1200)),
            stock: 10,
            images: vec![],
            sizes: vec!["M".to_string()],
            colors: vec![],
            is_featured: false,
            is_active: true,
        }
    }

    #[test]
    fn test_product_input_validation() {
        assert!(input().validate().is_ok());

        let mut bad = input();
        bad.name.en = " ".to_string();
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.price = Decimal::ZERO;
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.discount_price = Some(Decimal::from(1500));
        assert_eq!(
            bad.validate().unwrap_err(),
            "Discount price must be lower than the price"
        );

        let mut bad = input();
        bad.stock = -1;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_sort_deserializes_snake_case() {
        let sort: ProductSort = serde_json::from_str("\"price_desc\"").unwrap();
        assert_eq!(sort, ProductSort::PriceDesc);
        assert!(sort.order_by().ends_with("DESC"));
    }

    #[test]
    fn test_category_input_validation() {
        let ok = CategoryInput {
            name: LocalizedText::new("Sarees", ""),
            slug: "sarees".to_string(),
            image_url: None,
        };
        assert!(ok.validate().is_ok());
        let bad = CategoryInput {
            slug: String::new(),
            ..ok
        };
        assert!(bad.validate().is_err());
    }
}
