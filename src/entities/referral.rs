//! Referral entity - Commission bookkeeping for orders placed with a referral code.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Referral database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    /// Unique identifier for the referral
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Affiliate credited with the order
    pub affiliate_id: i64,
    /// Customer who placed the order
    pub customer_id: String,
    /// Customer email at submission time
    pub customer_email: String,
    /// Order the commission is earned on. Kept as a plain id because the order
    /// moves from `carts` to `purchases` (as `cart_id`) at checkout.
    pub order_id: i64,
    /// Code the customer entered
    pub referral_code: String,
    /// Commission amount in naira
    pub commission: f64,
    /// `"pending"` until paid out
    pub status: String,
    /// When the referral was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Referral and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each referral belongs to one affiliate
    #[sea_orm(
        belongs_to = "super::affiliate::Entity",
        from = "Column::AffiliateId",
        to = "super::affiliate::Column::Id"
    )]
    Affiliate,
}

impl Related<super::affiliate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Affiliate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
