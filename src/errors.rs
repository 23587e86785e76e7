use crate::core::money::Naira;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Amount is too large to total")]
    AmountOverflow,

    #[error("Budget of {} is below the packaging fee of {}", Naira::from(.budget), Naira::from(.fee))]
    BudgetBelowFee { budget: Decimal, fee: Decimal },

    #[error("Total of {} would exceed your budget of {}", Naira::from(.attempted), Naira::from(.budget))]
    BudgetExceeded { budget: Decimal, attempted: Decimal },

    #[error("Item {id} not found")]
    ItemNotFound { id: i64 },

    #[error("Item {id} cannot be ordered in more than one unit")]
    NotQuantifiable { id: i64 },

    #[error("Curation {id} not found")]
    CurationNotFound { id: Uuid },

    #[error("You must be logged in to place an order")]
    NotAuthenticated,

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Local storage error: {message}")]
    Storage { message: String },

    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for a user-facing validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the error is recoverable input the user can correct, as opposed to
    /// an upstream failure.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidAmount { .. }
                | Self::AmountOverflow
                | Self::BudgetBelowFee { .. }
                | Self::BudgetExceeded { .. }
                | Self::NotQuantifiable { .. }
                | Self::NotAuthenticated
        )
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
