//! Affiliate entity - Holders of referral codes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Affiliate database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliates")]
pub struct Model {
    /// Unique identifier for the affiliate
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User account of the affiliate
    pub user_id: String,
    /// Referral code customers enter on the package form
    #[sea_orm(unique)]
    pub code: String,
    /// When the affiliate was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Affiliate and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One affiliate earns many referrals
    #[sea_orm(has_many = "super::referral::Entity")]
    Referrals,
}

impl Related<super::referral::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Referrals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
