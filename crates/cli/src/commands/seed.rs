//! Demo catalog and content for development databases.
//!
//! Safe to run repeatedly: existing categories (matched by slug) keep their
//! products untouched, and the navbar and footer are only filled in when
//! empty.

use rust_decimal::Decimal;

use dokan_core::{LocalizedText, slugify};
use dokan_shared::db::{CategoryRepository, ContentRepository, ProductRepository};
use dokan_shared::models::{
    CategoryInput, FooterInput, FooterLink, NavbarItemInput, ProductInput, SocialLink,
};

use super::{CommandError, connect};

struct SeedProduct {
    name: (&'static str, &'static str),
    price: i64,
    discount_price: Option<i64>,
    stock: i32,
    sizes: &'static [&'static str],
    colors: &'static [&'static str],
    featured: bool,
}

struct SeedCategory {
    name: (&'static str, &'static str),
    products: &'static [SeedProduct],
}

const CATALOG: &[SeedCategory] = &[
    SeedCategory {
        name: ("Sarees", "শাড়ি"),
        products: &[
            SeedProduct {
                name: ("Jamdani Saree", "জামদানি শাড়ি"),
                price: 8500,
                discount_price: Some(7650),
                stock: 12,
                sizes: &[],
                colors: &["Red", "Off-white"],
                featured: true,
            },
            SeedProduct {
                name: ("Tangail Cotton Saree", "টাঙ্গাইল সুতি শাড়ি"),
                price: 2200,
                discount_price: None,
                stock: 30,
                sizes: &[],
                colors: &["Blue", "Green", "Yellow"],
                featured: false,
            },
        ],
    },
    SeedCategory {
        name: ("Panjabi", "পাঞ্জাবি"),
        products: &[
            SeedProduct {
                name: ("Embroidered Cotton Panjabi", "এমব্রয়ডারি সুতি পাঞ্জাবি"),
                price: 1850,
                discount_price: Some(1600),
                stock: 25,
                sizes: &["M", "L", "XL", "XXL"],
                colors: &["White", "Black"],
                featured: true,
            },
            SeedProduct {
                name: ("Khadi Panjabi", "খাদি পাঞ্জাবি"),
                price: 1450,
                discount_price: None,
                stock: 3,
                sizes: &["M", "L", "XL"],
                colors: &["Beige"],
                featured: false,
            },
        ],
    },
    SeedCategory {
        name: ("Handicrafts", "হস্তশিল্প"),
        products: &[SeedProduct {
            name: ("Nakshi Kantha", "নকশি কাঁথা"),
            price: 4200,
            discount_price: None,
            stock: 8,
            sizes: &[],
            colors: &[],
            featured: true,
        }],
    },
];

const NAVBAR: &[(&str, &str, &str)] = &[
    ("Home", "হোম", "/"),
    ("Shop", "শপ", "/products"),
    ("Sarees", "শাড়ি", "/categories/sarees"),
    ("Panjabi", "পাঞ্জাবি", "/categories/panjabi"),
    ("Track Order", "অর্ডার ট্র্যাক", "/track-order"),
];

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Insert demo categories and products. Returns how many of each were added.
async fn seed_catalog(
    categories: &CategoryRepository<'_>,
    products: &ProductRepository<'_>,
) -> Result<(usize, usize), CommandError> {
    let (mut added_categories, mut added_products) = (0, 0);

    for seed in CATALOG {
        let slug = slugify(seed.name.0);
        if categories.get_by_slug(&slug).await?.is_some() {
            tracing::info!(slug = %slug, "Category exists, skipping");
            continue;
        }

        let category = categories
            .create(&CategoryInput {
                name: LocalizedText::new(seed.name.0, seed.name.1),
                slug,
                image_url: None,
            })
            .await?;
        added_categories += 1;

        for product in seed.products {
            let input = ProductInput {
                name: LocalizedText::new(product.name.0, product.name.1),
                description: LocalizedText::default(),
                category_id: Some(category.id),
                price: Decimal::from(product.price),
                discount_price: product.discount_price.map(Decimal::from),
                stock: product.stock,
                images: Vec::new(),
                sizes: to_strings(product.sizes),
                colors: to_strings(product.colors),
                is_featured: product.featured,
                is_active: true,
            };
            input.validate().map_err(CommandError::Invalid)?;
            products.create(&input).await?;
            added_products += 1;
        }
    }

    Ok((added_categories, added_products))
}

/// Fill in the navbar and footer if they are empty.
async fn seed_content(content: &ContentRepository<'_>) -> Result<(), CommandError> {
    if content.list_navbar(false).await?.is_empty() {
        for (position, (en, bn, url)) in (0..).zip(NAVBAR) {
            content
                .create_navbar_item(&NavbarItemInput {
                    label: LocalizedText::new(*en, *bn),
                    url: (*url).to_string(),
                    position: Some(position),
                    is_active: true,
                })
                .await?;
        }
        tracing::info!(items = NAVBAR.len(), "Navbar seeded");
    } else {
        tracing::info!("Navbar exists, skipping");
    }

    if content.get_footer().await?.is_none() {
        content
            .upsert_footer(&FooterInput {
                about: LocalizedText::new(
                    "Handpicked Bangladeshi clothing and crafts, delivered nationwide.",
                    "বাছাই করা দেশীয় পোশাক ও হস্তশিল্প, সারা দেশে ডেলিভারি।",
                ),
                address: "House 12, Road 5, Dhanmondi, Dhaka 1205".to_string(),
                phone: "01700000000".to_string(),
                email: "hello@dokan.com.bd".to_string(),
                quick_links: vec![
                    FooterLink {
                        label: LocalizedText::new("Track Order", "অর্ডার ট্র্যাক"),
                        url: "/track-order".to_string(),
                    },
                    FooterLink {
                        label: LocalizedText::new("Contact", "যোগাযোগ"),
                        url: "/contact".to_string(),
                    },
                ],
                social_links: vec![SocialLink {
                    platform: "facebook".to_string(),
                    url: "https://facebook.com/dokan.bd".to_string(),
                }],
                copyright_text: "© Dokan".to_string(),
            })
            .await?;
        tracing::info!("Footer seeded");
    } else {
        tracing::info!("Footer exists, skipping");
    }

    Ok(())
}

/// Seed demo data.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    let (categories, products) = seed_catalog(
        &CategoryRepository::new(&pool),
        &ProductRepository::new(&pool),
    )
    .await?;
    tracing::info!(categories, products, "Catalog seeded");

    seed_content(&ContentRepository::new(&pool)).await?;

    tracing::info!("Seeding complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_catalog_is_valid() {
        for category in CATALOG {
            assert!(!slugify(category.name.0).is_empty());
            for product in category.products {
                if let Some(discount) = product.discount_price {
                    assert!(discount < product.price, "{}", product.name.0);
                }
                assert!(product.stock >= 0);
            }
        }
    }

    #[test]
    fn test_navbar_links_match_seeded_categories() {
        for (_, _, url) in NAVBAR {
            if let Some(slug) = url.strip_prefix("/categories/") {
                assert!(CATALOG.iter().any(|c| slugify(c.name.0) == slug), "{url}");
            }
        }
    }
}
