//! Curation session - the state of one user building one order.
//!
//! A session owns the package details, the selection, the prices it has seen and the
//! id of the draft being edited. Every mutation goes through the session so the
//! budget check and the state change happen together, and every change is written to
//! local storage under [`ACTIVE_SESSION_KEY`] so a restart does not lose the work.

use crate::{
    core::{
        catalog::{self, CatalogItem, PriceBook},
        curation::{self, Curation, CurationStore, DraftMatching, ResolvedCuration},
        order::{self, OrderReceipt},
        package::PackageDetails,
        pricing::Totals,
        selection::{Selection, SelectionAction, SelectionChange, SelectionEntry},
        storage::SharedStore,
        users::UserProfile,
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Local storage key of the in-progress session.
pub const ACTIVE_SESSION_KEY: &str = "active_curation";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionSnapshot {
    package: Option<PackageDetails>,
    items: Vec<SelectionEntry>,
    edit_id: Option<Uuid>,
}

pub struct CurationSession {
    package: Option<PackageDetails>,
    selection: Selection,
    prices: PriceBook,
    edit_id: Option<Uuid>,
    store: SharedStore,
    drafts: CurationStore,
}

impl CurationSession {
    /// Starts an empty session.
    #[must_use]
    pub fn new(store: SharedStore, matching: DraftMatching) -> Self {
        Self {
            package: None,
            selection: Selection::new(),
            prices: PriceBook::new(),
            edit_id: None,
            drafts: CurationStore::new(Arc::clone(&store), matching),
            store,
        }
    }

    /// Restores the session saved under [`ACTIVE_SESSION_KEY`], or starts an empty one.
    ///
    /// Prices are not part of the snapshot; call [`Self::refresh_prices`] before
    /// mutating a restored selection. A snapshot that no longer parses is discarded.
    pub fn restore(store: SharedStore, matching: DraftMatching) -> Result<Self> {
        let mut session = Self::new(store, matching);
        let Some(raw) = session.store.get(ACTIVE_SESSION_KEY)? else {
            return Ok(session);
        };

        match serde_json::from_str::<SessionSnapshot>(&raw) {
            Ok(snapshot) => {
                session.package = snapshot.package;
                session.selection = Selection::from_entries(snapshot.items);
                session.edit_id = snapshot.edit_id;
                info!(
                    "Restored session with {} selected items",
                    session.selection.len()
                );
            }
            Err(e) => {
                warn!("Discarding unreadable session snapshot: {}", e);
                session.store.remove(ACTIVE_SESSION_KEY)?;
            }
        }
        Ok(session)
    }

    #[must_use]
    pub const fn package(&self) -> Option<&PackageDetails> {
        self.package.as_ref()
    }

    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub const fn prices(&self) -> &PriceBook {
        &self.prices
    }

    /// Draft currently being edited, if the session was resumed from or saved as one.
    #[must_use]
    pub const fn edit_id(&self) -> Option<Uuid> {
        self.edit_id
    }

    #[must_use]
    pub const fn drafts(&self) -> &CurationStore {
        &self.drafts
    }

    /// Replaces the package details. Starting a new package empties the selection and
    /// leaves any draft being edited.
    pub fn start_package(&mut self, package: PackageDetails) {
        info!("Started package '{}'", package.name());
        self.package = Some(package);
        self.selection = Selection::new();
        self.edit_id = None;
        self.persist();
    }

    /// Makes items known to the session so they can be selected.
    pub fn remember_items(&mut self, items: impl IntoIterator<Item = CatalogItem>) {
        self.prices.extend(items);
    }

    /// Lists a category and remembers its items.
    pub async fn browse_category(
        &mut self,
        db: &DatabaseConnection,
        category_id: i64,
    ) -> Result<Vec<CatalogItem>> {
        let items = catalog::list_items(db, category_id).await?;
        self.remember_items(items.iter().cloned());
        Ok(items)
    }

    /// Re-reads the prices of every selected item.
    pub async fn refresh_prices(&mut self, db: &DatabaseConnection) -> Result<()> {
        let ids: Vec<i64> = self.selection.item_ids().collect();
        let items = catalog::get_items(db, &ids).await?;
        debug!("Refreshed {} of {} selected prices", items.len(), ids.len());
        self.remember_items(items);
        Ok(())
    }

    /// Applies a selection action against the package's effective budget.
    ///
    /// # Errors
    /// Propagates the selection's rejection; the session is unchanged in that case.
    pub fn apply(&mut self, action: SelectionAction) -> Result<SelectionChange> {
        let effective_budget = self
            .package
            .as_ref()
            .and_then(PackageDetails::effective_budget);
        let change = self.selection.apply(action, &self.prices, effective_budget)?;
        if change.is_change() {
            self.persist();
        }
        Ok(change)
    }

    pub fn toggle(&mut self, item_id: i64) -> Result<SelectionChange> {
        self.apply(SelectionAction::Toggle(item_id))
    }

    pub fn increment(&mut self, item_id: i64) -> Result<SelectionChange> {
        self.apply(SelectionAction::Increment(item_id))
    }

    pub fn decrement(&mut self, item_id: i64) -> Result<SelectionChange> {
        self.apply(SelectionAction::Decrement(item_id))
    }

    pub fn remove(&mut self, item_id: i64) -> Result<SelectionChange> {
        self.apply(SelectionAction::Remove(item_id))
    }

    pub fn clear(&mut self) -> Result<SelectionChange> {
        self.apply(SelectionAction::Clear)
    }

    pub fn totals(&self) -> Result<Totals> {
        Totals::compute(&self.selection, &self.prices)
    }

    /// Saves the session as a draft and keeps editing that draft.
    ///
    /// # Errors
    /// Returns a validation error if there are no package details or no items.
    pub fn save_draft(&mut self) -> Result<Curation> {
        let package = self
            .package
            .as_ref()
            .ok_or_else(|| Error::validation("Enter the package details before saving"))?;
        let saved = self.drafts.save(package, &self.selection, self.edit_id)?;
        self.edit_id = Some(saved.id);
        self.persist();
        Ok(saved)
    }

    /// Loads a saved draft into the session at current catalog prices.
    ///
    /// Items that no longer exist are dropped from the selection.
    pub async fn resume_draft(
        &mut self,
        db: &DatabaseConnection,
        id: Uuid,
    ) -> Result<ResolvedCuration> {
        let draft = self.drafts.get(id)?;
        let resolved = curation::resolve_items(db, &draft).await?;

        self.package = Some(draft.package.clone());
        self.selection = Selection::from_entries(resolved.lines.iter().map(|line| {
            SelectionEntry {
                item_id: line.item.id,
                quantity: line.quantity,
            }
        }));
        self.remember_items(resolved.lines.iter().map(|line| line.item.clone()));
        self.edit_id = Some(id);
        self.persist();

        info!("Resumed draft {} ({})", id, draft.package.name());
        Ok(resolved)
    }

    /// Submits the session as an order. A session without package details submits a
    /// curated box.
    ///
    /// On success the session is emptied and the receipt names the draft it came from;
    /// deleting that draft is left to the caller. On failure nothing changes.
    pub async fn submit(
        &mut self,
        db: &DatabaseConnection,
        user: Option<&UserProfile>,
        whatsapp_number: &str,
    ) -> Result<OrderReceipt> {
        let mut receipt = order::submit_order(
            db,
            user,
            self.package.as_ref(),
            &self.selection,
            whatsapp_number,
        )
        .await?;

        receipt.source_draft = self.edit_id;
        self.package = None;
        self.selection = Selection::new();
        self.edit_id = None;
        self.forget();
        Ok(receipt)
    }

    /// Drops everything, including the stored snapshot.
    pub fn reset(&mut self) {
        self.package = None;
        self.selection = Selection::new();
        self.edit_id = None;
        self.forget();
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            package: self.package.clone(),
            items: self.selection.entries().to_vec(),
            edit_id: self.edit_id,
        }
    }

    // Storage failures never undo an accepted mutation.
    fn persist(&self) {
        let result = serde_json::to_string(&self.snapshot())
            .map_err(Error::from)
            .and_then(|raw| self.store.set(ACTIVE_SESSION_KEY, &raw));
        if let Err(e) = result {
            warn!("Failed to persist curation session: {}", e);
        }
    }

    fn forget(&self) {
        if let Err(e) = self.store.remove(ACTIVE_SESSION_KEY) {
            warn!("Failed to clear curation session: {}", e);
        }
    }
}
