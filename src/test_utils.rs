//! Shared test utilities for `CurationBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating catalog, user and affiliate rows with sensible defaults.

use crate::{
    core::{
        catalog::{self, CatalogItem, CatalogKind, NewItem},
        money::to_f64,
        users::{self, NewUser, Role},
    },
    entities::{self, Item, item},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all database tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a catalog item without touching the database.
///
/// # Defaults
/// * `category_id`: 1
/// * `kind`: custom
/// * no description or image
pub fn catalog_item(id: i64, name: &str, price: Decimal, quantifiable: bool) -> CatalogItem {
    CatalogItem {
        id,
        category_id: 1,
        kind: CatalogKind::Custom,
        name: name.to_string(),
        price,
        description: None,
        image: None,
        quantifiable,
    }
}

/// Creates a category with no image.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
    kind: CatalogKind,
) -> Result<entities::category::Model> {
    catalog::create_category(db, name, kind, None).await
}

/// Creates an item under `category_id` with no description or image.
pub async fn create_test_item(
    db: &DatabaseConnection,
    category_id: i64,
    name: &str,
    price: Decimal,
    quantifiable: bool,
) -> Result<CatalogItem> {
    catalog::create_item(
        db,
        NewItem {
            category_id,
            name: name.to_string(),
            price,
            description: None,
            image: None,
            quantifiable,
        },
    )
    .await
}

/// Changes an item's price in place, as a back-office edit would.
pub async fn set_test_item_price(db: &DatabaseConnection, item_id: i64, price: Decimal) -> Result<()> {
    let model = Item::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or(Error::ItemNotFound { id: item_id })?;
    let mut active: item::ActiveModel = model.into();
    active.price = Set(to_f64(price)?);
    active.update(db).await?;
    Ok(())
}

/// Registers a customer with no username or phone number.
pub async fn create_test_user(
    db: &DatabaseConnection,
    id: &str,
    email: &str,
) -> Result<users::UserProfile> {
    users::register_user(
        db,
        NewUser {
            id: id.to_string(),
            email: email.to_string(),
            role: Role::Customer,
            username: None,
            phone_number: None,
        },
    )
    .await
}

/// Registers an affiliate holding `code` for an existing user.
pub async fn create_test_affiliate(
    db: &DatabaseConnection,
    user_id: &str,
    code: &str,
) -> Result<entities::affiliate::Model> {
    users::register_affiliate(db, user_id, code).await
}
