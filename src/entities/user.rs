//! User entity - Profile rows keyed by the auth provider's user id.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Auth provider user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Login email
    pub email: String,
    /// `"user"`, `"customer"` or `"admin"`
    pub role: String,
    /// Optional display name
    pub username: Option<String>,
    /// Optional contact number
    pub phone_number: Option<String>,
    /// When the profile was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
