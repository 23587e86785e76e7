//! Catalog seed configuration from config.toml
//!
//! Categories and items listed under `[[categories]]` are inserted into the
//! datastore on first run so a fresh install has something to browse.

use crate::core::catalog::CatalogKind;
use serde::Deserialize;

/// A category to seed, with its items
#[derive(Debug, Deserialize, Clone)]
pub struct CategorySeed {
    /// Category name
    pub name: String,
    /// Catalog the category belongs to
    pub kind: CatalogKind,
    /// Optional image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Items listed under this category
    #[serde(default)]
    pub items: Vec<ItemSeed>,
}

/// A single item to seed
#[derive(Debug, Deserialize, Clone)]
pub struct ItemSeed {
    /// Item name
    pub name: String,
    /// Unit price in naira
    pub price: f64,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Optional image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Whether the item is sold in variable quantities
    #[serde(default)]
    pub quantifiable: bool,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        categories: Vec<CategorySeed>,
    }

    #[test]
    fn test_parse_category_seed() {
        let toml_str = r#"
            [[categories]]
            name = "Chocolates"
            kind = "custom"

            [[categories.items]]
            name = "Truffle box"
            price = 4900.0
            quantifiable = true

            [[categories.items]]
            name = "Gift card"
            price = 1250.5

            [[categories]]
            name = "Birthday boxes"
            kind = "curated"
            image = "https://cdn.example.com/birthday.png"
        "#;

        let parsed: Wrapper = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.categories.len(), 2);
        assert_eq!(parsed.categories[0].kind, CatalogKind::Custom);
        assert_eq!(parsed.categories[0].items.len(), 2);
        assert!(parsed.categories[0].items[0].quantifiable);
        assert!(!parsed.categories[0].items[1].quantifiable);
        assert_eq!(parsed.categories[0].items[1].price, 1250.5);
        assert_eq!(parsed.categories[1].kind, CatalogKind::Curated);
        assert!(parsed.categories[1].items.is_empty());
    }
}
