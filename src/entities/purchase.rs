//! Purchase entity - Paid orders moved out of the cart at checkout.
//!
//! Mirrors the cart columns plus the payment reference returned by the
//! payment widget.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Id the order had while in the cart
    pub cart_id: i64,
    pub user_id: String,
    pub username: String,
    pub package_name: String,
    pub budget: Option<f64>,
    pub items: Json,
    pub curated_items: Json,
    pub total_price: f64,
    pub status: String,
    pub referral_code: Option<String>,
    /// Payment reference from the payment provider
    pub payment_ref: String,
    /// When the order was originally submitted
    pub ordered_at: DateTimeUtc,
    /// When checkout completed
    pub purchased_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
