/// Budget checks for selection mutations
pub mod budget;

/// Cart listing, checkout and purchase history
pub mod cart;

/// Categories, items and the session price book
pub mod catalog;

/// Saved drafts in client-side storage
pub mod curation;

/// Order confirmation message and deep link
pub mod message;

/// Rounding, fixed charges and naira formatting
pub mod money;

/// Order submission
pub mod order;

/// Package form details
pub mod package;

/// Subtotal, packaging fee and final total
pub mod pricing;

/// Selected items and quantities
pub mod selection;

/// The in-progress curation session
pub mod session;

/// Client-side key-value storage
pub mod storage;

/// Signed-in user profiles
pub mod users;
