//! User profiles - the signed-in customer as seen by cart and order operations.
//!
//! Authentication itself is handled by the hosted auth provider; this module only
//! reads and writes the profile row keyed by the provider's user id.

use crate::{
    entities::{Affiliate, User, affiliate, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument};

const FALLBACK_DISPLAY_NAME: &str = "Customer";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Customer,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            other => Err(Error::validation(format!("Unknown role '{other}'"))),
        }
    }
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub username: Option<String>,
    pub phone_number: Option<String>,
}

impl UserProfile {
    /// Name shown on orders: username, then email, then a generic label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| Some(self.email.as_str()).filter(|email| !email.trim().is_empty()))
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }
}

impl TryFrom<user::Model> for UserProfile {
    type Error = Error;

    fn try_from(model: user::Model) -> Result<Self> {
        Ok(Self {
            role: model.role.parse()?,
            id: model.id,
            email: model.email,
            username: model.username,
            phone_number: model.phone_number,
        })
    }
}

/// Loads the profile of a signed-in user, `None` if no profile row exists.
#[instrument(skip(db))]
pub async fn current_user(db: &DatabaseConnection, user_id: &str) -> Result<Option<UserProfile>> {
    User::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .map(UserProfile::try_from)
        .transpose()
}

/// Fields for a new profile row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub username: Option<String>,
    pub phone_number: Option<String>,
}

/// Creates the profile row for a freshly signed-up user.
///
/// # Errors
/// Returns a validation error if the id or email is empty, or a database error if the
/// id is already registered.
#[instrument(skip(db, new_user), fields(user_id = %new_user.id))]
pub async fn register_user(db: &DatabaseConnection, new_user: NewUser) -> Result<UserProfile> {
    if new_user.id.trim().is_empty() {
        return Err(Error::validation("User id cannot be empty"));
    }
    if new_user.email.trim().is_empty() {
        return Err(Error::validation("Email is required"));
    }

    let model = user::ActiveModel {
        id: Set(new_user.id),
        email: Set(new_user.email.trim().to_string()),
        role: Set(new_user.role.as_str().to_string()),
        username: Set(new_user.username),
        phone_number: Set(new_user.phone_number),
        created_at: Set(chrono::Utc::now()),
    };
    let profile = UserProfile::try_from(model.insert(db).await?)?;
    info!("Registered user {} as {}", profile.id, profile.role);
    Ok(profile)
}

/// Edited profile fields. The form always submits all three; blank optional fields
/// clear the stored value.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub phone_number: String,
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Replaces the editable fields of an existing profile.
///
/// # Errors
/// Returns a validation error if the email is empty or the user has no profile.
#[instrument(skip(db, update))]
pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: &str,
    update: ProfileUpdate,
) -> Result<UserProfile> {
    let email = update.email.trim();
    if email.is_empty() {
        return Err(Error::validation("Email is required"));
    }
    let model = User::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::validation(format!("No user with id '{user_id}'")))?;

    let mut active: user::ActiveModel = model.into();
    active.email = Set(email.to_string());
    active.username = Set(non_blank(update.username));
    active.phone_number = Set(non_blank(update.phone_number));
    let profile = UserProfile::try_from(active.update(db).await?)?;
    info!("Updated profile of {}", profile.id);
    Ok(profile)
}

/// Gives a user a referral code customers can enter on the package form.
///
/// Codes are stored trimmed and must be unique.
///
/// # Errors
/// Returns a validation error if the code is blank, the user has no profile, or the
/// code is already taken.
#[instrument(skip(db))]
pub async fn register_affiliate(
    db: &DatabaseConnection,
    user_id: &str,
    code: &str,
) -> Result<affiliate::Model> {
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::validation("Referral code cannot be empty"));
    }
    if current_user(db, user_id).await?.is_none() {
        return Err(Error::validation(format!("No user with id '{user_id}'")));
    }
    let taken = Affiliate::find()
        .filter(affiliate::Column::Code.eq(code))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(Error::validation(format!(
            "Referral code '{code}' is already taken"
        )));
    }

    let model = affiliate::ActiveModel {
        user_id: Set(user_id.to_string()),
        code: Set(code.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Registered affiliate code {} for {}", model.code, user_id);
    Ok(model)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn profile(username: Option<&str>, email: &str) -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            email: email.to_string(),
            role: Role::Customer,
            username: username.map(str::to_string),
            phone_number: None,
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(profile(Some("ada"), "ada@example.com").display_name(), "ada");
        assert_eq!(profile(None, "ada@example.com").display_name(), "ada@example.com");
        assert_eq!(profile(Some(" "), "").display_name(), "Customer");
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
    }

    #[tokio::test]
    async fn test_register_and_load() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(current_user(&db, "auth-1").await?.is_none());

        let registered = create_test_user(&db, "auth-1", "ada@example.com").await?;
        let loaded = current_user(&db, "auth-1").await?.unwrap();
        assert_eq!(loaded, registered);
        assert_eq!(loaded.role, Role::Customer);

        let duplicate = create_test_user(&db, "auth-1", "other@example.com").await;
        assert!(matches!(duplicate, Err(Error::Database(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_register_affiliate() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "auth-1", "ada@example.com").await?;

        let affiliate = register_affiliate(&db, "auth-1", " ADA10 ").await?;
        assert_eq!(affiliate.code, "ADA10");

        assert!(matches!(
            register_affiliate(&db, "auth-1", "ADA10").await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            register_affiliate(&db, "missing", "NEW10").await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            register_affiliate(&db, "auth-1", "  ").await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_profile() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "auth-1", "ada@example.com").await?;

        let updated = update_profile(
            &db,
            "auth-1",
            ProfileUpdate {
                username: " Ada ".to_string(),
                email: "ada@lovelace.dev".to_string(),
                phone_number: "+2348000000000".to_string(),
            },
        )
        .await?;
        assert_eq!(updated.username.as_deref(), Some("Ada"));
        assert_eq!(updated.email, "ada@lovelace.dev");
        assert_eq!(current_user(&db, "auth-1").await?.unwrap(), updated);

        let cleared = update_profile(
            &db,
            "auth-1",
            ProfileUpdate {
                username: String::new(),
                email: "ada@lovelace.dev".to_string(),
                phone_number: "  ".to_string(),
            },
        )
        .await?;
        assert_eq!(cleared.username, None);
        assert_eq!(cleared.phone_number, None);
        assert_eq!(cleared.display_name(), "ada@lovelace.dev");
        assert_eq!(cleared.role, Role::Customer);

        let blank_email = ProfileUpdate {
            username: "Ada".to_string(),
            email: " ".to_string(),
            phone_number: String::new(),
        };
        assert!(matches!(
            update_profile(&db, "auth-1", blank_email.clone()).await,
            Err(Error::Validation { .. })
        ));
        let missing = ProfileUpdate {
            email: "who@example.com".to_string(),
            ..blank_email
        };
        assert!(matches!(
            update_profile(&db, "nobody", missing).await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }
}
