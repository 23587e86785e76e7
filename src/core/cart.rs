//! Cart business logic - Listing submitted orders, checkout and purchase history.
//!
//! Payment itself happens in an external payment widget; checkout records the
//! reference it hands back and moves every cart order of the user into
//! `purchases` in one datastore transaction.

use crate::{
    core::{
        catalog::{self, PriceBook},
        curation::ResolvedLine,
        money::{round2, to_decimal},
        pricing,
        selection::SelectionEntry,
        users::UserProfile,
    },
    entities::{Cart, Purchase, cart, purchase},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Stored line item. Older rows hold bare ids, newer ones `{id, quantity}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Full {
        id: i64,
        #[serde(default = "default_quantity")]
        quantity: u32,
    },
    Bare(i64),
}

const fn default_quantity() -> u32 {
    1
}

impl From<StoredEntry> for SelectionEntry {
    fn from(entry: StoredEntry) -> Self {
        match entry {
            StoredEntry::Full { id, quantity } => Self {
                item_id: id,
                quantity,
            },
            StoredEntry::Bare(id) => Self {
                item_id: id,
                quantity: 1,
            },
        }
    }
}

/// Parses an `items` or `curated_items` column. `null` means no items.
///
/// # Errors
/// Returns a serialization error if the column is neither `null` nor a list of entries.
pub fn parse_entries(value: &Json) -> Result<Vec<SelectionEntry>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let stored: Vec<StoredEntry> = serde_json::from_value(value.clone())?;
    Ok(stored
        .into_iter()
        .map(SelectionEntry::from)
        .filter(|entry| entry.quantity > 0)
        .collect())
}

/// A cart order with its items resolved against the catalog.
#[derive(Debug, Clone)]
pub struct CartOrderView {
    pub order: cart::Model,
    pub lines: Vec<ResolvedLine>,
    /// Ids that no longer exist in the catalog
    pub missing: Vec<i64>,
}

/// Everything in a user's cart.
#[derive(Debug, Clone)]
pub struct CartSummary {
    pub orders: Vec<CartOrderView>,
    /// Sum of the stored order totals
    pub grand_total: Decimal,
}

/// Lists the user's cart orders, newest first.
#[instrument(skip(db))]
pub async fn list_cart(db: &DatabaseConnection, user_id: &str) -> Result<CartSummary> {
    let orders = Cart::find()
        .filter(cart::Column::UserId.eq(user_id))
        .order_by_desc(cart::Column::CreatedAt)
        .order_by_desc(cart::Column::Id)
        .all(db)
        .await?;

    let mut parsed = Vec::with_capacity(orders.len());
    for order in orders {
        let mut entries = parse_entries(&order.items)?;
        entries.extend(parse_entries(&order.curated_items)?);
        parsed.push((order, entries));
    }

    let mut ids: Vec<i64> = parsed
        .iter()
        .flat_map(|(_, entries)| entries.iter().map(|entry| entry.item_id))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    let prices: PriceBook = catalog::get_items(db, &ids).await?.into_iter().collect();

    let mut grand_total = Decimal::ZERO;
    let mut views = Vec::with_capacity(parsed.len());
    for (order, entries) in parsed {
        grand_total = grand_total
            .checked_add(to_decimal(order.total_price)?)
            .map(round2)
            .ok_or(Error::AmountOverflow)?;

        let mut lines = Vec::with_capacity(entries.len());
        let mut missing = Vec::new();
        for entry in entries {
            match prices.get(entry.item_id) {
                Some(item) => lines.push(ResolvedLine {
                    item: item.clone(),
                    quantity: entry.quantity,
                    line_total: pricing::line_total(item.price, entry.quantity)?,
                }),
                None => {
                    warn!("Order {} references missing item {}", order.id, entry.item_id);
                    missing.push(entry.item_id);
                }
            }
        }
        views.push(CartOrderView {
            order,
            lines,
            missing,
        });
    }

    Ok(CartSummary {
        orders: views,
        grand_total,
    })
}

/// Moves every cart order of `user` into `purchases` with the payment reference.
///
/// # Errors
/// Returns an error if:
/// - The payment reference is blank
/// - The cart is empty
/// - Any insert or delete fails, in which case nothing is changed
#[instrument(skip(db, user), fields(user_id = %user.id))]
pub async fn checkout(
    db: &DatabaseConnection,
    user: &UserProfile,
    payment_reference: &str,
) -> Result<Vec<purchase::Model>> {
    let payment_reference = payment_reference.trim();
    if payment_reference.is_empty() {
        return Err(Error::validation("Payment reference is required"));
    }

    let txn = db.begin().await?;

    let orders = Cart::find()
        .filter(cart::Column::UserId.eq(user.id.as_str()))
        .order_by_asc(cart::Column::Id)
        .all(&txn)
        .await?;
    if orders.is_empty() {
        return Err(Error::validation("Your cart is empty"));
    }

    let purchased_at = chrono::Utc::now();
    let mut purchases = Vec::with_capacity(orders.len());
    for order in orders {
        let purchase = purchase::ActiveModel {
            cart_id: Set(order.id),
            user_id: Set(order.user_id),
            username: Set(order.username),
            package_name: Set(order.package_name),
            budget: Set(order.budget),
            items: Set(order.items),
            curated_items: Set(order.curated_items),
            total_price: Set(order.total_price),
            status: Set(order.status),
            referral_code: Set(order.referral_code),
            payment_ref: Set(payment_reference.to_string()),
            ordered_at: Set(order.created_at),
            purchased_at: Set(purchased_at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        purchases.push(purchase);
    }

    let deleted = Cart::delete_many()
        .filter(cart::Column::UserId.eq(user.id.as_str()))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    info!(
        "Checked out {} orders for {} with reference {}",
        deleted.rows_affected, user.id, payment_reference
    );
    Ok(purchases)
}

/// Lists the user's purchases, newest first.
#[instrument(skip(db))]
pub async fn list_purchases(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<purchase::Model>> {
    Purchase::find()
        .filter(purchase::Column::UserId.eq(user_id))
        .order_by_desc(purchase::Column::PurchasedAt)
        .order_by_desc(purchase::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
