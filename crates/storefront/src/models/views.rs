//! JSON views with text resolved for the requested language.

use rust_decimal::Decimal;
use serde::Serialize;

use dokan_core::{CategoryId, Language, LocalizedText, ProductId};
use dokan_shared::models::{Category, CategorySummary, Product};

use super::cart::{Cart, CartLine};

/// A category as served to shoppers.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: CategoryId,
    /// Name in the requested language.
    pub name: String,
    pub name_i18n: LocalizedText,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CategoryView {
    #[must_use]
    pub fn new(category: &Category, lang: Language) -> Self {
        Self {
            id: category.id,
            name: category.name.get(lang).to_string(),
            name_i18n: category.name.clone(),
            slug: category.slug.clone(),
            image_url: category.image_url.clone(),
        }
    }

    fn from_summary(summary: &CategorySummary, lang: Language) -> Self {
        Self {
            id: summary.id,
            name: summary.name.get(lang).to_string(),
            name_i18n: summary.name.clone(),
            slug: summary.slug.clone(),
            image_url: None,
        }
    }
}

/// A product as served to shoppers.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub name_i18n: LocalizedText,
    pub description_i18n: LocalizedText,
    pub category: Option<CategoryView>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub discount_percentage: Option<u8>,
    pub effective_price: Decimal,
    pub stock: i32,
    pub in_stock: bool,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub is_featured: bool,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, lang: Language) -> Self {
        Self {
            id: product.id,
            name: product.name.get(lang).to_string(),
            description: product.description.get(lang).to_string(),
            name_i18n: product.name.clone(),
            description_i18n: product.description.clone(),
            category: product
                .category
                .as_ref()
                .map(|c| CategoryView::from_summary(c, lang)),
            price: product.price,
            discount_price: product.discount_price,
            discount_percentage: product.discount_percentage(),
            effective_price: product.effective_price(),
            stock: product.stock,
            in_stock: product.stock > 0,
            images: product.images.clone(),
            sizes: product.sizes.clone(),
            colors: product.colors.clone(),
            is_featured: product.is_featured,
        }
    }
}

/// A cart line priced from the current catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
    pub available_stock: i32,
}

/// Why a cart line was changed while pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartAdjustment {
    /// The product was deleted or hidden; the line was dropped.
    Unavailable,
    /// Out of stock; the line was dropped.
    OutOfStock,
    /// Less stock than requested; the quantity was reduced.
    QuantityReduced,
}

/// A change made to the cart while pricing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartNotice {
    pub product_id: ProductId,
    pub reason: CartAdjustment,
}

/// The priced cart returned by `GET /api/cart`.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub notices: Vec<CartNotice>,
    pub item_count: i32,
    pub subtotal: Decimal,
}

impl CartView {
    /// Price `cart` against `products`, returning the view and the cart with
    /// unavailable lines dropped and quantities reduced to what is in stock.
    #[must_use]
    pub fn price(cart: &Cart, products: &[Product], lang: Language) -> (Self, Cart) {
        let mut items = Vec::with_capacity(cart.lines.len());
        let mut notices = Vec::new();
        let mut kept = Cart::default();

        for line in &cart.lines {
            let Some(product) = products
                .iter()
                .find(|p| p.id == line.product_id && p.is_active)
            else {
                notices.push(CartNotice {
                    product_id: line.product_id,
                    reason: CartAdjustment::Unavailable,
                });
                continue;
            };

            if product.stock <= 0 {
                notices.push(CartNotice {
                    product_id: line.product_id,
                    reason: CartAdjustment::OutOfStock,
                });
                continue;
            }

            let quantity = line.quantity.min(product.stock);
            if quantity < line.quantity {
                notices.push(CartNotice {
                    product_id: line.product_id,
                    reason: CartAdjustment::QuantityReduced,
                });
            }

            let unit_price = product.effective_price();
            items.push(CartItemView {
                product_id: product.id,
                name: product.name.get(lang).to_string(),
                image_url: product.primary_image().map(str::to_string),
                size: line.size.clone(),
                color: line.color.clone(),
                unit_price,
                quantity,
                line_total: unit_price * Decimal::from(quantity),
                available_stock: product.stock,
            });
            kept.lines.push(CartLine {
                quantity,
                ..line.clone()
            });
        }

        let view = Self {
            item_count: items.iter().map(|i| i.quantity).sum(),
            subtotal: items.iter().map(|i| i.line_total).sum(),
            items,
            notices,
        };
        (view, kept)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use chrono::Utc;

    use super::*;

    pub(crate) fn product(id: i32, price: i64, discount: Option<i64>, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: LocalizedText::new(format!("Product {id}"), format!("পণ্য {id}")),
            description: LocalizedText::new("Handwoven cotton", ""),
            category: Some(CategorySummary {
                id: CategoryId::new(1),
                name: LocalizedText::new("Saree", "শাড়ি"),
                slug: "saree".to_string(),
            }),
            price: Decimal::from(price),
            discount_price: discount.map(Decimal::from),
            stock,
            images: vec![format!("/uploads/{id}.jpg")],
            sizes: vec![],
            colors: vec![],
            is_featured: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_product_view_resolves_language() {
        let view = ProductView::new(&product(1, 1000, Some(750), 3), Language::Bn);
        assert_eq!(view.name, "পণ্য 1");
        // Blank Bengali description falls back to English.
        assert_eq!(view.description, "Handwoven cotton");
        assert_eq!(view.discount_percentage, Some(25));
        assert_eq!(view.effective_price, Decimal::from(750));
        assert_eq!(view.category.unwrap().name, "শাড়ি");
    }

    #[test]
    fn test_product_view_json_has_computed_fields() {
        let json =
            serde_json::to_value(ProductView::new(&product(2, 500, None, 0), Language::En)).unwrap();
        assert_eq!(json["effective_price"], "500");
        assert!(json["discount_percentage"].is_null());
        assert_eq!(json["in_stock"], false);
        assert_eq!(json["name_i18n"]["bn"], "পণ্য 2");
    }

    #[test]
    fn test_cart_pricing_drops_and_reduces() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 2, None, None).unwrap();
        cart.add(ProductId::new(2), 5, None, None).unwrap();
        cart.add(ProductId::new(3), 1, None, None).unwrap();
        cart.add(ProductId::new(4), 1, None, None).unwrap();

        let mut hidden = product(4, 100, None, 10);
        hidden.is_active = false;
        let products = vec![
            product(1, 1000, Some(800), 10),
            product(2, 300, None, 3),
            product(3, 200, None, 0),
            hidden,
        ];

        let (view, kept) = CartView::price(&cart, &products, Language::En);

        assert_eq!(view.items.len(), 2);
        assert_eq!(view.item_count, 5);
        assert_eq!(view.subtotal, Decimal::from(800 * 2 + 300 * 3));
        assert_eq!(
            view.notices,
            vec![
                CartNotice {
                    product_id: ProductId::new(2),
                    reason: CartAdjustment::QuantityReduced
                },
                CartNotice {
                    product_id: ProductId::new(3),
                    reason: CartAdjustment::OutOfStock
                },
                CartNotice {
                    product_id: ProductId::new(4),
                    reason: CartAdjustment::Unavailable
                },
            ]
        );
        assert_eq!(kept.product_ids(), vec![ProductId::new(1), ProductId::new(2)]);
        assert_eq!(kept.lines[1].quantity, 3);
    }
}
