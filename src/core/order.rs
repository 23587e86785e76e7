//! Order submission business logic - Turns a finished selection into a cart order.
//!
//! Submission re-reads every selected item from the catalog, re-validates the budget
//! against those fresh prices, and writes the order and its optional referral in one
//! datastore transaction. The referral insert runs inside a savepoint: if it fails,
//! only the referral is rolled back, the order still commits, and the failure is
//! returned as a warning on the receipt.

use crate::{
    core::{
        budget,
        catalog::{self, CatalogKind, PriceBook},
        message::{self, OrderSummary, SummaryLine},
        money::{REFERRAL_COMMISSION_RATE, round2, to_f64},
        package::PackageDetails,
        pricing::{self, Totals},
        selection::{Selection, SelectionEntry},
        users::UserProfile,
    },
    entities::{Affiliate, affiliate, cart, referral},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseTransaction, Set, TransactionTrait, prelude::*};
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Lifecycle of a cart order. Only `Pending` is ever written here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(Error::validation(format!("Unknown order status '{other}'"))),
        }
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    pub order: cart::Model,
    /// Present only when the referral code resolved and its record was written
    pub referral: Option<referral::Model>,
    /// Non-fatal problems the user should still be told about
    pub warnings: Vec<String>,
    pub message: String,
    pub whatsapp_url: String,
    pub totals: Totals,
    /// Draft the order was built from, so the caller can offer to delete it
    pub source_draft: Option<Uuid>,
}

/// Commission owed on an order total.
#[must_use]
pub fn commission_for(final_total: Decimal) -> Decimal {
    round2(final_total * REFERRAL_COMMISSION_RATE)
}

/// Submits an order.
///
/// # Arguments
/// * `user` - Signed-in customer, `None` when nobody is signed in
/// * `package` - Package details, `None` for a curated box order
/// * `selection` - Items to order
/// * `whatsapp_number` - Destination of the confirmation message
///
/// # Errors
/// Returns an error, without writing anything, if:
/// - No user is signed in
/// - The selection is empty
/// - A selected item no longer exists
/// - The subtotal at current prices exceeds the effective budget
/// - The affiliate lookup or the order insert fails
#[instrument(skip(db, user, package, selection))]
pub async fn submit_order(
    db: &DatabaseConnection,
    user: Option<&UserProfile>,
    package: Option<&PackageDetails>,
    selection: &Selection,
    whatsapp_number: &str,
) -> Result<OrderReceipt> {
    let user = user.ok_or(Error::NotAuthenticated)?;
    if selection.is_empty() {
        return Err(Error::validation("Select at least one item before ordering"));
    }

    let curated_box = package.is_none();
    let package = package.cloned().unwrap_or_else(|| {
        PackageDetails::curated_box(chrono::Local::now().date_naive())
    });

    let ids: Vec<i64> = selection.item_ids().collect();
    let prices: PriceBook = catalog::get_items(db, &ids).await?.into_iter().collect();
    if let Some(missing) = ids.iter().copied().find(|id| prices.get(*id).is_none()) {
        return Err(Error::ItemNotFound { id: missing });
    }

    let totals = Totals::compute(selection, &prices)?;
    if let Some(effective_budget) = package.effective_budget()
        && !budget::fits_budget(totals.subtotal, Some(effective_budget))
    {
        return Err(Error::BudgetExceeded {
            budget: round2(effective_budget),
            attempted: totals.subtotal,
        });
    }

    let mut warnings = Vec::new();
    let affiliate = match package.referral_code() {
        Some(code) => {
            let found = Affiliate::find()
                .filter(affiliate::Column::Code.eq(code))
                .one(db)
                .await?;
            if found.is_none() {
                warn!("Referral code '{}' does not match any affiliate", code);
                warnings.push(format!(
                    "Referral code '{code}' was not recognised; your order was placed without it."
                ));
            }
            found
        }
        None => None,
    };

    let (custom_entries, curated_entries) = split_by_kind(selection, &prices);

    let txn = db.begin().await?;

    let order = cart::ActiveModel {
        user_id: Set(user.id.clone()),
        username: Set(user.display_name().to_string()),
        package_name: Set(package.name().to_string()),
        budget: Set(package.budget().map(to_f64).transpose()?),
        items: Set(serde_json::to_value(&custom_entries)?),
        curated_items: Set(serde_json::to_value(&curated_entries)?),
        total_price: Set(to_f64(totals.final_total)?),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        referral_code: Set(affiliate.as_ref().map(|a| a.code.clone())),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let referral = match &affiliate {
        Some(affiliate) => {
            match insert_referral(&txn, affiliate, user, &order, totals.final_total).await {
                Ok(referral) => Some(referral),
                Err(e) => {
                    warn!("Referral for order {} was not recorded: {}", order.id, e);
                    warnings.push(format!(
                        "Your order was placed, but the referral could not be recorded: {e}"
                    ));
                    None
                }
            }
        }
        None => None,
    };

    txn.commit().await?;
    info!(
        "Order {} placed by {} for {}",
        order.id, user.id, totals.final_total
    );

    let lines = selection
        .entries()
        .iter()
        .filter_map(|entry| {
            prices.get(entry.item_id).map(|item| {
                pricing::line_total(item.price, entry.quantity)
                    .map(|total| SummaryLine::new(item, entry.quantity, total))
            })
        })
        .collect::<Result<Vec<SummaryLine>>>()?;
    let message = OrderSummary {
        customer: user.display_name(),
        package: &package,
        lines: &lines,
        totals,
        curated_box,
    }
    .render()?;
    let whatsapp_url = message::whatsapp_link(whatsapp_number, &message);

    Ok(OrderReceipt {
        order,
        referral,
        warnings,
        message,
        whatsapp_url,
        totals,
        source_draft: None,
    })
}

/// Writes the referral inside its own savepoint so a failure leaves the order intact.
async fn insert_referral(
    txn: &DatabaseTransaction,
    affiliate: &affiliate::Model,
    user: &UserProfile,
    order: &cart::Model,
    final_total: Decimal,
) -> Result<referral::Model> {
    let savepoint = txn.begin().await?;
    let commission = to_f64(commission_for(final_total))?;

    let inserted = referral::ActiveModel {
        affiliate_id: Set(affiliate.id),
        customer_id: Set(user.id.clone()),
        customer_email: Set(user.email.clone()),
        order_id: Set(order.id),
        referral_code: Set(affiliate.code.clone()),
        commission: Set(commission),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&savepoint)
    .await;

    match inserted {
        Ok(referral) => {
            savepoint.commit().await?;
            Ok(referral)
        }
        Err(e) => {
            savepoint.rollback().await?;
            Err(e.into())
        }
    }
}

/// Splits the selection into custom and curated catalog entries.
fn split_by_kind(
    selection: &Selection,
    prices: &PriceBook,
) -> (Vec<SelectionEntry>, Vec<SelectionEntry>) {
    selection
        .entries()
        .iter()
        .copied()
        .partition(|entry| {
            prices
                .get(entry.item_id)
                .is_none_or(|item| item.kind == CatalogKind::Custom)
        })
}
