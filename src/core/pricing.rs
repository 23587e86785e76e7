//! Pricing and totals derived from the selection.
//!
//! The subtotal is rounded to two places after every accumulation step, not just
//! at the end, so repeated fractional prices produce the same totals the storefront
//! has always shown.

use crate::{
    core::{
        catalog::PriceBook,
        money::{PACKAGING_FEE, format_naira, round2},
        selection::Selection,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use tracing::warn;

const SHORTCUT_BASE_WIDTH: u32 = 100;
const SHORTCUT_WIDTH_PER_CHAR: u32 = 8;
const SHORTCUT_MAX_WIDTH: u32 = 160;
const SHORTCUT_BASE_CHARS: u32 = 5;

/// Price of `quantity` units, rounded to two places.
///
/// # Errors
/// Returns `Error::AmountOverflow` if the product does not fit in a `Decimal`.
pub fn line_total(price: Decimal, quantity: u32) -> Result<Decimal> {
    price
        .checked_mul(Decimal::from(quantity))
        .map(round2)
        .ok_or(Error::AmountOverflow)
}

/// Sum of line totals over the selection.
///
/// Entries whose price is unknown contribute nothing; they are logged so the gap
/// is visible.
///
/// # Errors
/// Returns `Error::AmountOverflow` if a line or the running sum does not fit in a
/// `Decimal`.
pub fn subtotal(selection: &Selection, prices: &PriceBook) -> Result<Decimal> {
    selection
        .entries()
        .iter()
        .try_fold(Decimal::ZERO, |acc, entry| match prices.price_of(entry.item_id) {
            Some(price) => price
                .checked_mul(Decimal::from(entry.quantity))
                .and_then(|line| acc.checked_add(line))
                .map(round2)
                .ok_or(Error::AmountOverflow),
            None => {
                warn!("No price known for item {}, leaving it out of the subtotal", entry.item_id);
                Ok(acc)
            }
        })
}

/// Subtotal plus the packaging fee.
///
/// # Errors
/// Returns `Error::AmountOverflow` if the sum does not fit in a `Decimal`.
pub fn final_total(subtotal: Decimal) -> Result<Decimal> {
    subtotal
        .checked_add(PACKAGING_FEE)
        .map(round2)
        .ok_or(Error::AmountOverflow)
}

/// Width in pixels of the compact total badge for a given label.
#[must_use]
pub fn shortcut_width(text: &str) -> u32 {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    let extra = chars.saturating_sub(SHORTCUT_BASE_CHARS);
    SHORTCUT_BASE_WIDTH
        .saturating_add(extra.saturating_mul(SHORTCUT_WIDTH_PER_CHAR))
        .min(SHORTCUT_MAX_WIDTH)
}

/// Totals for the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub packaging_fee: Decimal,
    pub final_total: Decimal,
}

impl Totals {
    pub fn compute(selection: &Selection, prices: &PriceBook) -> Result<Self> {
        Self::from_subtotal(subtotal(selection, prices)?)
    }

    pub fn from_subtotal(subtotal: Decimal) -> Result<Self> {
        Ok(Self {
            subtotal,
            packaging_fee: PACKAGING_FEE,
            final_total: final_total(subtotal)?,
        })
    }

    /// Detail view lines: subtotal, packaging fee and total.
    #[must_use]
    pub fn detail_text(&self) -> String {
        format!(
            "Subtotal: {}\nPackaging Fee: {}\nTotal: {}",
            format_naira(self.subtotal),
            format_naira(self.packaging_fee),
            format_naira(self.final_total)
        )
    }

    /// Compact label for the floating total badge.
    #[must_use]
    pub fn shortcut_text(&self) -> String {
        format_naira(self.final_total)
    }

    #[must_use]
    pub fn shortcut_width(&self) -> u32 {
        shortcut_width(&self.shortcut_text())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::selection::SelectionEntry;
    use crate::test_utils::catalog_item;

    fn sample() -> (Selection, PriceBook) {
        let prices: PriceBook = [
            catalog_item(1, "A", Decimal::new(500, 0), true),
            catalog_item(2, "B", Decimal::new(125_050, 2), false),
        ]
        .into_iter()
        .collect();
        let selection = Selection::from_entries([
            SelectionEntry {
                item_id: 1,
                quantity: 2,
            },
            SelectionEntry {
                item_id: 2,
                quantity: 1,
            },
        ]);
        (selection, prices)
    }

    #[test]
    fn test_subtotal_and_final_total() {
        let (selection, prices) = sample();
        let totals = Totals::compute(&selection, &prices).unwrap();
        assert_eq!(totals.subtotal, Decimal::new(225_050, 2));
        assert_eq!(totals.final_total, Decimal::new(1_225_050, 2));
        assert_eq!(totals.packaging_fee, PACKAGING_FEE);
    }

    #[test]
    fn test_empty_selection_still_carries_fee() {
        let totals = Totals::compute(&Selection::new(), &PriceBook::new()).unwrap();
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.final_total, PACKAGING_FEE);
    }

    #[test]
    fn test_unknown_prices_are_left_out() {
        let (selection, _) = sample();
        let prices: PriceBook = [catalog_item(1, "A", Decimal::new(500, 0), true)]
            .into_iter()
            .collect();
        assert_eq!(subtotal(&selection, &prices).unwrap(), Decimal::new(1_000, 0));
    }

    #[test]
    fn test_intermediate_rounding() {
        let prices: PriceBook = [catalog_item(1, "Bead", Decimal::new(3_335, 3), true)]
            .into_iter()
            .collect();
        let selection = Selection::from_entries([SelectionEntry {
            item_id: 1,
            quantity: 3,
        }]);
        // 3.335 * 3 = 10.005, rounded half away from zero
        assert_eq!(subtotal(&selection, &prices).unwrap(), Decimal::new(1_001, 2));
    }

    #[test]
    fn test_detail_text_lists_fee() {
        let (selection, prices) = sample();
        let text = Totals::compute(&selection, &prices).unwrap().detail_text();
        assert!(text.contains("Subtotal: ₦2,250.50"), "{text}");
        assert!(text.contains("Packaging Fee: ₦10,000.00"), "{text}");
        assert!(text.contains("Total: ₦12,250.50"), "{text}");
    }

    #[test]
    fn test_oversized_amounts_are_rejected() {
        let huge = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        assert!(matches!(line_total(huge, 2), Err(Error::AmountOverflow)));
        assert_eq!(line_total(huge, 1).unwrap(), huge);
        assert!(matches!(final_total(Decimal::MAX), Err(Error::AmountOverflow)));

        let prices: PriceBook = [
            catalog_item(1, "Estate", huge, true),
            catalog_item(2, "Island", huge, false),
        ]
        .into_iter()
        .collect();
        let selection = Selection::from_entries([
            SelectionEntry {
                item_id: 1,
                quantity: 1,
            },
            SelectionEntry {
                item_id: 2,
                quantity: 1,
            },
        ]);
        assert!(matches!(
            Totals::compute(&selection, &prices),
            Err(Error::AmountOverflow)
        ));
    }

    #[test]
    fn test_shortcut_width_is_monotonic_and_capped() {
        assert_eq!(shortcut_width("₦0.00"), 100);
        assert_eq!(shortcut_width("₦"), 100);
        assert_eq!(shortcut_width("₦100.00"), 116);
        assert_eq!(shortcut_width("₦1,000,000,000.00"), 160);

        let mut last = 0;
        for len in 0..30 {
            let width = shortcut_width(&"9".repeat(len));
            assert!(width >= last);
            last = width;
        }
    }
}
