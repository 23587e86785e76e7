//! Entity module - Contains all SeaORM entity definitions for the backend datastore.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod affiliate;
pub mod cart;
pub mod category;
pub mod item;
pub mod purchase;
pub mod referral;
pub mod user;

// Re-export specific types to avoid conflicts
pub use affiliate::{Column as AffiliateColumn, Entity as Affiliate, Model as AffiliateModel};
pub use cart::{Column as CartColumn, Entity as Cart, Model as CartModel};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use item::{Column as ItemColumn, Entity as Item, Model as ItemModel};
pub use purchase::{Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel};
pub use referral::{Column as ReferralColumn, Entity as Referral, Model as ReferralModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
