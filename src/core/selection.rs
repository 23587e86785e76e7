//! Selection state - which catalog items the user intends to order, and how many.
//!
//! Every mutation goes through [`Selection::apply`]. Adds and increments are gated by
//! the budget evaluator before anything changes, so a rejected action leaves the
//! selection exactly as it was.

use crate::{
    core::{budget, catalog::PriceBook},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One selected item. Quantity is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    #[serde(rename = "id")]
    pub item_id: i64,
    pub quantity: u32,
}

/// A mutation requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionAction {
    /// Select or deselect a single-unit item
    Toggle(i64),
    /// Add one unit, inserting the item if absent
    Increment(i64),
    /// Remove one unit, dropping the entry at zero
    Decrement(i64),
    /// Drop the entry regardless of quantity
    Remove(i64),
    /// Empty the selection
    Clear,
}

/// What an applied action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Added { item_id: i64 },
    Removed { item_id: i64 },
    QuantityChanged { item_id: i64, quantity: u32 },
    Cleared,
    Unchanged,
}

impl SelectionChange {
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Ordered set of selection entries keyed by item id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    entries: Vec<SelectionEntry>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a selection from stored entries, dropping zero quantities and merging
    /// duplicate ids into the first occurrence.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = SelectionEntry>) -> Self {
        let mut selection = Self::new();
        for entry in entries.into_iter().filter(|entry| entry.quantity > 0) {
            match selection.position(entry.item_id) {
                Some(index) => {
                    if let Some(existing) = selection.entries.get_mut(index) {
                        existing.quantity = existing.quantity.saturating_add(entry.quantity);
                    }
                }
                None => selection.entries.push(entry),
            }
        }
        selection
    }

    #[must_use]
    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Quantity currently selected, 0 when absent.
    #[must_use]
    pub fn quantity_of(&self, item_id: i64) -> u32 {
        self.entries
            .iter()
            .find(|entry| entry.item_id == item_id)
            .map_or(0, |entry| entry.quantity)
    }

    #[must_use]
    pub fn contains(&self, item_id: i64) -> bool {
        self.position(item_id).is_some()
    }

    pub fn item_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|entry| entry.item_id)
    }

    fn position(&self, item_id: i64) -> Option<usize> {
        self.entries.iter().position(|entry| entry.item_id == item_id)
    }

    /// Applies an action, checking adds and increments against `effective_budget`.
    ///
    /// # Errors
    /// - `Error::ItemNotFound` when adding an item missing from `prices`
    /// - `Error::NotQuantifiable` when incrementing a single-unit item already selected
    /// - `Error::BudgetExceeded` when the new subtotal would pass the budget
    ///
    /// The selection is untouched whenever an error is returned.
    pub fn apply(
        &mut self,
        action: SelectionAction,
        prices: &PriceBook,
        effective_budget: Option<Decimal>,
    ) -> Result<SelectionChange> {
        let change = match action {
            SelectionAction::Toggle(item_id) => self.toggle(item_id, prices, effective_budget)?,
            SelectionAction::Increment(item_id) => {
                self.increment(item_id, prices, effective_budget)?
            }
            SelectionAction::Decrement(item_id) => self.decrement(item_id),
            SelectionAction::Remove(item_id) => self.remove(item_id),
            SelectionAction::Clear => self.clear(),
        };
        debug!("Applied {:?}: {:?}", action, change);
        Ok(change)
    }

    fn toggle(
        &mut self,
        item_id: i64,
        prices: &PriceBook,
        effective_budget: Option<Decimal>,
    ) -> Result<SelectionChange> {
        if self.contains(item_id) {
            return Ok(self.remove(item_id));
        }

        let item = prices.get(item_id).ok_or(Error::ItemNotFound { id: item_id })?;
        budget::check_budget(self, prices, item, 1, effective_budget)?;
        self.entries.push(SelectionEntry {
            item_id,
            quantity: 1,
        });
        Ok(SelectionChange::Added { item_id })
    }

    fn increment(
        &mut self,
        item_id: i64,
        prices: &PriceBook,
        effective_budget: Option<Decimal>,
    ) -> Result<SelectionChange> {
        let item = prices.get(item_id).ok_or(Error::ItemNotFound { id: item_id })?;
        let current = self.quantity_of(item_id);
        if current > 0 && !item.quantifiable {
            return Err(Error::NotQuantifiable { id: item_id });
        }

        let candidate = current.saturating_add(1);
        budget::check_budget(self, prices, item, candidate, effective_budget)?;

        match self.position(item_id) {
            Some(index) => {
                if let Some(entry) = self.entries.get_mut(index) {
                    entry.quantity = candidate;
                }
                Ok(SelectionChange::QuantityChanged {
                    item_id,
                    quantity: candidate,
                })
            }
            None => {
                self.entries.push(SelectionEntry {
                    item_id,
                    quantity: 1,
                });
                Ok(SelectionChange::Added { item_id })
            }
        }
    }

    fn decrement(&mut self, item_id: i64) -> SelectionChange {
        let Some(index) = self.position(item_id) else {
            return SelectionChange::Unchanged;
        };
        let quantity = self.entries.get(index).map_or(0, |entry| entry.quantity);
        if quantity <= 1 {
            self.entries.remove(index);
            return SelectionChange::Removed { item_id };
        }
        if let Some(entry) = self.entries.get_mut(index) {
            entry.quantity = quantity - 1;
        }
        SelectionChange::QuantityChanged {
            item_id,
            quantity: quantity - 1,
        }
    }

    fn remove(&mut self, item_id: i64) -> SelectionChange {
        match self.position(item_id) {
            Some(index) => {
                self.entries.remove(index);
                SelectionChange::Removed { item_id }
            }
            None => SelectionChange::Unchanged,
        }
    }

    fn clear(&mut self) -> SelectionChange {
        if self.entries.is_empty() {
            return SelectionChange::Unchanged;
        }
        self.entries.clear();
        SelectionChange::Cleared
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::catalog_item;

    fn prices() -> PriceBook {
        [
            catalog_item(1, "Card", Decimal::new(500, 0), false),
            catalog_item(2, "Truffles", Decimal::new(4_900, 0), true),
            catalog_item(3, "Candle", Decimal::new(125_050, 2), true),
        ]
        .into_iter()
        .collect()
    }

    fn assert_invariants(selection: &Selection) {
        let mut seen = std::collections::HashSet::new();
        for entry in selection.entries() {
            assert!(entry.quantity >= 1, "entry {entry:?} has zero quantity");
            assert!(seen.insert(entry.item_id), "duplicate entry {entry:?}");
        }
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let prices = prices();
        let mut selection = Selection::new();

        let change = selection.apply(SelectionAction::Toggle(1), &prices, None).unwrap();
        assert_eq!(change, SelectionChange::Added { item_id: 1 });
        assert_eq!(selection.quantity_of(1), 1);

        let change = selection.apply(SelectionAction::Toggle(1), &prices, None).unwrap();
        assert_eq!(change, SelectionChange::Removed { item_id: 1 });
        assert!(selection.is_empty());
    }

    #[test]
    fn test_increment_and_decrement() {
        let prices = prices();
        let mut selection = Selection::new();

        selection.apply(SelectionAction::Increment(2), &prices, None).unwrap();
        let change = selection.apply(SelectionAction::Increment(2), &prices, None).unwrap();
        assert_eq!(
            change,
            SelectionChange::QuantityChanged {
                item_id: 2,
                quantity: 2
            }
        );

        selection.apply(SelectionAction::Decrement(2), &prices, None).unwrap();
        assert_eq!(selection.quantity_of(2), 1);
        let change = selection.apply(SelectionAction::Decrement(2), &prices, None).unwrap();
        assert_eq!(change, SelectionChange::Removed { item_id: 2 });
        assert!(!selection.contains(2));
    }

    #[test]
    fn test_decrement_and_remove_absent_are_noops() {
        let prices = prices();
        let mut selection = Selection::new();
        selection.apply(SelectionAction::Toggle(1), &prices, None).unwrap();
        let before = selection.clone();

        let change = selection.apply(SelectionAction::Decrement(3), &prices, None).unwrap();
        assert_eq!(change, SelectionChange::Unchanged);
        let change = selection.apply(SelectionAction::Remove(3), &prices, None).unwrap();
        assert_eq!(change, SelectionChange::Unchanged);
        assert_eq!(selection, before);
    }

    #[test]
    fn test_remove_ignores_quantity() {
        let prices = prices();
        let mut selection = Selection::new();
        for _ in 0..3 {
            selection.apply(SelectionAction::Increment(3), &prices, None).unwrap();
        }
        assert_eq!(selection.quantity_of(3), 3);

        selection.apply(SelectionAction::Remove(3), &prices, None).unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_unknown_item_is_rejected() {
        let prices = prices();
        let mut selection = Selection::new();
        assert!(matches!(
            selection.apply(SelectionAction::Toggle(99), &prices, None),
            Err(Error::ItemNotFound { id: 99 })
        ));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_single_unit_item_cannot_be_incremented_twice() {
        let prices = prices();
        let mut selection = Selection::new();
        selection.apply(SelectionAction::Increment(1), &prices, None).unwrap();
        assert!(matches!(
            selection.apply(SelectionAction::Increment(1), &prices, None),
            Err(Error::NotQuantifiable { id: 1 })
        ));
        assert_eq!(selection.quantity_of(1), 1);
    }

    #[test]
    fn test_budget_rejection_leaves_selection_unchanged() {
        let prices = prices();
        let mut selection = Selection::new();
        let budget = Some(Decimal::new(5_000, 0));

        selection.apply(SelectionAction::Increment(2), &prices, budget).unwrap();
        let before = selection.clone();

        let result = selection.apply(SelectionAction::Increment(2), &prices, budget);
        assert!(matches!(result, Err(Error::BudgetExceeded { .. })));
        assert_eq!(selection, before);
        assert_eq!(selection.quantity_of(2), 1);

        // 4,900 + 500 is over 5,000
        let result = selection.apply(SelectionAction::Toggle(1), &prices, budget);
        assert!(matches!(result, Err(Error::BudgetExceeded { .. })));
        assert_eq!(selection, before);
    }

    #[test]
    fn test_mixed_sequence_keeps_invariants() {
        let prices = prices();
        let mut selection = Selection::new();
        let actions = [
            SelectionAction::Increment(3),
            SelectionAction::Toggle(1),
            SelectionAction::Increment(3),
            SelectionAction::Decrement(1),
            SelectionAction::Decrement(1),
            SelectionAction::Increment(2),
            SelectionAction::Toggle(1),
            SelectionAction::Decrement(3),
            SelectionAction::Decrement(3),
            SelectionAction::Decrement(3),
            SelectionAction::Increment(2),
            SelectionAction::Remove(2),
            SelectionAction::Toggle(3),
        ];
        for action in actions {
            let _ = selection.apply(action, &prices, Some(Decimal::new(20_000, 0)));
            assert_invariants(&selection);
        }
        assert_eq!(selection.quantity_of(1), 1);
        assert_eq!(selection.quantity_of(3), 1);
        assert!(!selection.contains(2));
    }

    #[test]
    fn test_clear() {
        let prices = prices();
        let mut selection = Selection::new();
        assert_eq!(
            selection.apply(SelectionAction::Clear, &prices, None).unwrap(),
            SelectionChange::Unchanged
        );
        selection.apply(SelectionAction::Toggle(1), &prices, None).unwrap();
        assert_eq!(
            selection.apply(SelectionAction::Clear, &prices, None).unwrap(),
            SelectionChange::Cleared
        );
        assert!(selection.is_empty());
    }

    #[test]
    fn test_from_entries_normalizes() {
        let selection = Selection::from_entries([
            SelectionEntry {
                item_id: 1,
                quantity: 2,
            },
            SelectionEntry {
                item_id: 2,
                quantity: 0,
            },
            SelectionEntry {
                item_id: 1,
                quantity: 1,
            },
        ]);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.quantity_of(1), 3);
    }

    #[test]
    fn test_serializes_as_id_quantity_list() {
        let selection = Selection::from_entries([SelectionEntry {
            item_id: 7,
            quantity: 2,
        }]);
        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(json, serde_json::json!([{ "id": 7, "quantity": 2 }]));
    }
}
