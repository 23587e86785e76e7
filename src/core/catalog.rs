//! Catalog business logic - Reads categories and items from the datastore.
//!
//! Items are converted into [`CatalogItem`], which carries the price as a two-place
//! `Decimal`. The curation core never writes to the catalog except when seeding a
//! fresh install; category and item administration happens elsewhere.

use crate::{
    config::catalog::CategorySeed,
    core::money::{to_decimal, to_f64},
    entities::{Category, Item, category, item},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// Which catalog a category or item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    /// Build-your-own package items
    Custom,
    /// Pre-curated box items
    Curated,
}

impl CatalogKind {
    /// Value stored in the `kind` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Curated => "curated",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "custom" => Ok(Self::Custom),
            "curated" => Ok(Self::Curated),
            other => Err(Error::validation(format!("Unknown catalog kind '{other}'"))),
        }
    }
}

/// A catalog item as seen by the curation core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: i64,
    pub category_id: i64,
    pub kind: CatalogKind,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub image: Option<String>,
    pub quantifiable: bool,
}

impl TryFrom<item::Model> for CatalogItem {
    type Error = Error;

    fn try_from(model: item::Model) -> Result<Self> {
        Ok(Self {
            id: model.id,
            category_id: model.category_id,
            kind: model.kind.parse()?,
            price: to_decimal(model.price)?,
            name: model.name,
            description: model.description,
            image: model.image,
            quantifiable: model.quantifiable,
        })
    }
}

/// Items the current session knows prices for, keyed by item id.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    items: HashMap<i64, CatalogItem>,
}

impl PriceBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or refreshes an item. Later inserts win, so re-fetched prices replace stale ones.
    pub fn insert(&mut self, item: CatalogItem) {
        self.items.insert(item.id, item);
    }

    #[must_use]
    pub fn get(&self, item_id: i64) -> Option<&CatalogItem> {
        self.items.get(&item_id)
    }

    #[must_use]
    pub fn price_of(&self, item_id: i64) -> Option<Decimal> {
        self.items.get(&item_id).map(|item| item.price)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Extend<CatalogItem> for PriceBook {
    fn extend<T: IntoIterator<Item = CatalogItem>>(&mut self, iter: T) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl FromIterator<CatalogItem> for PriceBook {
    fn from_iter<T: IntoIterator<Item = CatalogItem>>(iter: T) -> Self {
        let mut book = Self::new();
        book.extend(iter);
        book
    }
}

/// Lists the categories of one catalog, ordered by name.
#[instrument(skip(db))]
pub async fn list_categories(
    db: &DatabaseConnection,
    kind: CatalogKind,
) -> Result<Vec<category::Model>> {
    Category::find()
        .filter(category::Column::Kind.eq(kind.as_str()))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the items of a category, ordered by name.
#[instrument(skip(db))]
pub async fn list_items(db: &DatabaseConnection, category_id: i64) -> Result<Vec<CatalogItem>> {
    let models = Item::find()
        .filter(item::Column::CategoryId.eq(category_id))
        .order_by_asc(item::Column::Name)
        .all(db)
        .await?;
    debug!("Loaded {} items for category {}", models.len(), category_id);
    models.into_iter().map(CatalogItem::try_from).collect()
}

/// Looks up a single item, returning `None` if it no longer exists.
pub async fn get_item<C: ConnectionTrait>(db: &C, item_id: i64) -> Result<Option<CatalogItem>> {
    Item::find_by_id(item_id)
        .one(db)
        .await?
        .map(CatalogItem::try_from)
        .transpose()
}

/// Fetches the items with the given ids. Ids that no longer exist are simply absent
/// from the result.
pub async fn get_items<C: ConnectionTrait>(db: &C, item_ids: &[i64]) -> Result<Vec<CatalogItem>> {
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }
    Item::find()
        .filter(item::Column::Id.is_in(item_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(CatalogItem::try_from)
        .collect()
}

/// Creates a category.
///
/// # Errors
/// Returns a validation error if the name is empty.
pub async fn create_category<C: ConnectionTrait>(
    db: &C,
    name: &str,
    kind: CatalogKind,
    image: Option<String>,
) -> Result<category::Model> {
    if name.trim().is_empty() {
        return Err(Error::validation("Category name cannot be empty"));
    }

    let category = category::ActiveModel {
        name: Set(name.trim().to_string()),
        kind: Set(kind.as_str().to_string()),
        image: Set(image),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    category.insert(db).await.map_err(Into::into)
}

/// Fields for a new catalog item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub category_id: i64,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub image: Option<String>,
    pub quantifiable: bool,
}

/// Creates an item under an existing category. The item inherits the category's kind.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or the price is negative
/// - The category does not exist
/// - The database insert fails
pub async fn create_item<C: ConnectionTrait>(db: &C, new_item: NewItem) -> Result<CatalogItem> {
    if new_item.name.trim().is_empty() {
        return Err(Error::validation("Item name cannot be empty"));
    }
    if new_item.price.is_sign_negative() {
        return Err(Error::InvalidAmount {
            amount: to_f64(new_item.price)?,
        });
    }

    let category = Category::find_by_id(new_item.category_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            Error::validation(format!("Category {} does not exist", new_item.category_id))
        })?;

    let model = item::ActiveModel {
        category_id: Set(category.id),
        kind: Set(category.kind),
        name: Set(new_item.name.trim().to_string()),
        price: Set(to_f64(new_item.price)?),
        description: Set(new_item.description),
        image: Set(new_item.image),
        quantifiable: Set(new_item.quantifiable),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    CatalogItem::try_from(model.insert(db).await?)
}

/// Inserts the configured catalog seed, skipping categories that already exist
/// (matched by name and kind). Returns the number of categories created.
///
/// Each category is written with its items in one transaction, so a failing item
/// leaves no partial category behind for later runs to skip.
#[instrument(skip(db, seeds))]
pub async fn seed_catalog(db: &DatabaseConnection, seeds: &[CategorySeed]) -> Result<usize> {
    info!("Seeding catalog from {} configured categories.", seeds.len());
    let mut created = 0;

    for seed in seeds {
        let existing = Category::find()
            .filter(category::Column::Name.eq(seed.name.trim()))
            .filter(category::Column::Kind.eq(seed.kind.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            debug!("Category '{}' ({}) already exists, skipping", seed.name, seed.kind);
            continue;
        }

        let txn = db.begin().await?;
        let category = create_category(&txn, &seed.name, seed.kind, seed.image.clone()).await?;
        for item_seed in &seed.items {
            create_item(
                &txn,
                NewItem {
                    category_id: category.id,
                    name: item_seed.name.clone(),
                    price: to_decimal(item_seed.price)?,
                    description: item_seed.description.clone(),
                    image: item_seed.image.clone(),
                    quantifiable: item_seed.quantifiable,
                },
            )
            .await?;
        }
        txn.commit().await?;
        info!(
            "Seeded category '{}' with {} items",
            category.name,
            seed.items.len()
        );
        created += 1;
    }

    Ok(created)
}
