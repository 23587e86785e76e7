//! Curation (draft) store - named, unsubmitted selections kept in local storage.
//!
//! Drafts never reach the backend. They are stored as one JSON list under
//! [`CURATIONS_KEY`]. Prices are not frozen at save time; [`resolve_items`]
//! re-reads the catalog every time a draft is displayed.

use crate::{
    core::{
        catalog::{self, CatalogItem, PriceBook},
        package::PackageDetails,
        pricing::{self, Totals},
        selection::{Selection, SelectionEntry},
        storage::SharedStore,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Local storage key holding every saved draft.
pub const CURATIONS_KEY: &str = "curations";

/// How a re-saved draft finds the record it replaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftMatching {
    /// Only an explicit edit id selects an existing draft
    #[default]
    Id,
    /// Drafts with the same package name are the same draft (legacy stores)
    Name,
}

/// A saved draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curation {
    pub id: Uuid,
    pub package: PackageDetails,
    pub items: Vec<SelectionEntry>,
    pub created_at: DateTime<Utc>,
}

impl Curation {
    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection::from_entries(self.items.iter().copied())
    }
}

/// Draft store over the client-side key-value store.
#[derive(Clone)]
pub struct CurationStore {
    store: SharedStore,
    matching: DraftMatching,
}

impl CurationStore {
    #[must_use]
    pub fn new(store: SharedStore, matching: DraftMatching) -> Self {
        Self { store, matching }
    }

    #[must_use]
    pub const fn matching(&self) -> DraftMatching {
        self.matching
    }

    /// Saves a draft, updating in place when it matches an existing one.
    ///
    /// An `edit_id` that is still present in the store always wins. Without one,
    /// `DraftMatching::Name` falls back to matching by package name and
    /// `DraftMatching::Id` inserts a new record.
    ///
    /// An updated draft keeps its id and creation timestamp.
    ///
    /// # Errors
    /// - `Error::Validation` if the selection is empty
    /// - storage or serialization errors from the underlying store
    pub fn save(
        &self,
        package: &PackageDetails,
        selection: &Selection,
        edit_id: Option<Uuid>,
    ) -> Result<Curation> {
        if selection.is_empty() {
            return Err(Error::validation("Select at least one item before saving"));
        }

        let mut curations = self.list_all()?;
        let position = edit_id
            .and_then(|id| curations.iter().position(|c| c.id == id))
            .or_else(|| match self.matching {
                DraftMatching::Name => curations
                    .iter()
                    .position(|c| c.package.name() == package.name()),
                DraftMatching::Id => None,
            });

        let saved = match position.and_then(|index| curations.get_mut(index)) {
            Some(existing) => {
                existing.package = package.clone();
                existing.items = selection.entries().to_vec();
                debug!("Updated draft {} ({})", existing.id, package.name());
                existing.clone()
            }
            None => {
                let curation = Curation {
                    id: Uuid::new_v4(),
                    package: package.clone(),
                    items: selection.entries().to_vec(),
                    created_at: Utc::now(),
                };
                info!("Saved new draft {} ({})", curation.id, package.name());
                curations.push(curation.clone());
                curation
            }
        };

        self.write(&curations)?;
        Ok(saved)
    }

    /// Every saved draft in save order. An absent key means no drafts.
    pub fn list_all(&self) -> Result<Vec<Curation>> {
        match self.store.get(CURATIONS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Looks up a draft by id.
    ///
    /// # Errors
    /// Returns `Error::CurationNotFound` if no draft has that id.
    pub fn get(&self, id: Uuid) -> Result<Curation> {
        self.list_all()?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(Error::CurationNotFound { id })
    }

    /// Removes a draft. Returns whether anything was removed.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let mut curations = self.list_all()?;
        let before = curations.len();
        curations.retain(|c| c.id != id);
        if curations.len() == before {
            return Ok(false);
        }
        self.write(&curations)?;
        info!("Deleted draft {}", id);
        Ok(true)
    }

    fn write(&self, curations: &[Curation]) -> Result<()> {
        let raw = serde_json::to_string(curations)?;
        self.store.set(CURATIONS_KEY, &raw)
    }
}

/// One displayable line of a resolved draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
    pub item: CatalogItem,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// A draft joined with current catalog prices.
#[derive(Debug, Clone)]
pub struct ResolvedCuration {
    pub curation: Curation,
    pub lines: Vec<ResolvedLine>,
    pub totals: Totals,
    /// Ids that no longer exist in the catalog
    pub missing: Vec<i64>,
}

/// Joins a draft with the current catalog. Items that no longer resolve are left out
/// of the lines and totals and listed in `missing`.
#[instrument(skip(db, curation), fields(curation_id = %curation.id))]
pub async fn resolve_items(
    db: &DatabaseConnection,
    curation: &Curation,
) -> Result<ResolvedCuration> {
    let selection = curation.selection();
    let ids: Vec<i64> = selection.item_ids().collect();
    let prices: PriceBook = catalog::get_items(db, &ids).await?.into_iter().collect();

    let mut lines = Vec::with_capacity(selection.len());
    let mut missing = Vec::new();
    for entry in selection.entries() {
        match prices.get(entry.item_id) {
            Some(item) => lines.push(ResolvedLine {
                item: item.clone(),
                quantity: entry.quantity,
                line_total: pricing::line_total(item.price, entry.quantity)?,
            }),
            None => {
                warn!("Draft item {} no longer exists in the catalog", entry.item_id);
                missing.push(entry.item_id);
            }
        }
    }

    Ok(ResolvedCuration {
        curation: curation.clone(),
        lines,
        totals: Totals::compute(&selection, &prices)?,
        missing,
    })
}
