//! Budget evaluator - decides whether a proposed add or increment fits the package budget.
//!
//! The budget checked here is the effective budget: the user's budget minus the
//! packaging fee. The subtotal is re-derived from the full selection on every check
//! instead of being carried as a running total.

use crate::{
    core::{
        catalog::{CatalogItem, PriceBook},
        money::round2,
        pricing,
        selection::Selection,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use tracing::debug;

/// Subtotal the selection would have if `item` were set to `candidate_quantity`.
///
/// # Errors
/// Returns `Error::AmountOverflow` if the proposed subtotal does not fit in a `Decimal`.
pub fn proposed_subtotal(
    selection: &Selection,
    prices: &PriceBook,
    item: &CatalogItem,
    candidate_quantity: u32,
) -> Result<Decimal> {
    let current_subtotal = pricing::subtotal(selection, prices)?;
    let current_contribution = pricing::line_total(item.price, selection.quantity_of(item.id))?;
    let candidate_contribution = pricing::line_total(item.price, candidate_quantity)?;
    current_subtotal
        .checked_sub(current_contribution)
        .and_then(|rest| rest.checked_add(candidate_contribution))
        .map(round2)
        .ok_or(Error::AmountOverflow)
}

/// Whether `total` fits inside `effective_budget`. An unset budget admits everything.
#[must_use]
pub fn fits_budget(total: Decimal, effective_budget: Option<Decimal>) -> bool {
    effective_budget.is_none_or(|budget| round2(total) <= round2(budget))
}

/// Admits or rejects setting `item` to `candidate_quantity`.
///
/// # Errors
/// Returns `Error::BudgetExceeded` carrying the effective budget and the subtotal the
/// mutation would have produced, or `Error::AmountOverflow` if that subtotal cannot
/// be computed.
pub fn check_budget(
    selection: &Selection,
    prices: &PriceBook,
    item: &CatalogItem,
    candidate_quantity: u32,
    effective_budget: Option<Decimal>,
) -> Result<()> {
    let Some(budget) = effective_budget else {
        return Ok(());
    };

    let attempted = proposed_subtotal(selection, prices, item, candidate_quantity)?;
    if fits_budget(attempted, Some(budget)) {
        return Ok(());
    }

    debug!(
        "Rejected {} x{}: subtotal {} over budget {}",
        item.name, candidate_quantity, attempted, budget
    );
    Err(Error::BudgetExceeded {
        budget: round2(budget),
        attempted,
    })
}
