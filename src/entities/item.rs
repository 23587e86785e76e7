//! Item entity - A purchasable catalog item.
//!
//! Quantifiable items are sold in variable integer quantities; all others are
//! single-unit selections.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Category this item is listed under
    pub category_id: i64,
    /// Catalog this item belongs to, mirrors its category
    pub kind: String,
    /// Display name
    pub name: String,
    /// Unit price in naira
    pub price: f64,
    /// Optional description shown under the price
    pub description: Option<String>,
    /// Optional image URL from object storage
    pub image: Option<String>,
    /// Whether the item is sold in variable quantities
    pub quantifiable: bool,
    /// When the item was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Item and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
