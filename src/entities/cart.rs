//! Cart entity - A submitted order awaiting payment and fulfilment.
//!
//! `items` and `curated_items` hold JSON arrays of `{ "id": .., "quantity": .. }`
//! entries referencing the custom and curated catalogs respectively.
//! `total_price` already includes the packaging fee.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cart order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "carts")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer who placed the order
    pub user_id: String,
    /// Customer display name at submission time
    pub username: String,
    /// Package name from the package form
    pub package_name: String,
    /// Declared budget, if any
    pub budget: Option<f64>,
    /// Custom catalog selections
    pub items: Json,
    /// Curated catalog selections
    pub curated_items: Json,
    /// Subtotal plus packaging fee
    pub total_price: f64,
    /// `"pending"`, `"delivered"` or `"cancelled"`
    pub status: String,
    /// Referral code, only when it resolved to an affiliate
    pub referral_code: Option<String>,
    /// When the order was submitted
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
