//! The batch: what a user selected to promote in one deployment attempt.

use crate::ids::{BatchId, ExtensionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the category holding extension rows.
pub const EXTRAS: &str = "extras";

/// Items selected for promotion from staging to production.
///
/// Host content (`post_types`, `taxonomies`, ...) is kept per category as a
/// list of item ids. Extension rows ("extras") are kept per extension id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub id: BatchId,
    #[serde(default)]
    categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    extras: BTreeMap<ExtensionId, Vec<String>>,
}

impl Batch {
    /// Creates an empty batch with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a batch from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Adds a content item under `category`. Returns `true` if the item was
    /// added.
    ///
    /// Selecting an item twice is a no-op. The `extras` category is reserved
    /// and ignored here; use [`Batch::select_extra`].
    pub fn select(&mut self, category: impl Into<String>, item: impl Into<String>) -> bool {
        let category = category.into();
        if category == EXTRAS {
            return false;
        }
        let items = self.categories.entry(category).or_default();
        let item = item.into();
        if items.contains(&item) {
            return false;
        }
        items.push(item);
        true
    }

    /// Marks an extension row as part of the batch.
    pub fn select_extra(&mut self, extension_id: &ExtensionId, row_id: impl Into<String>) {
        let rows = self.extras.entry(extension_id.clone()).or_default();
        let row_id = row_id.into();
        if !rows.contains(&row_id) {
            rows.push(row_id);
        }
    }

    /// Removes an extension row. Returns `true` if it was selected.
    pub fn deselect_extra(&mut self, extension_id: &ExtensionId, row_id: &str) -> bool {
        let Some(rows) = self.extras.get_mut(extension_id) else {
            return false;
        };
        let before = rows.len();
        rows.retain(|r| r != row_id);
        let removed = rows.len() != before;
        if rows.is_empty() {
            self.extras.remove(extension_id);
        }
        removed
    }

    /// Whether `row_id` of `extension_id` is selected.
    #[must_use]
    pub fn contains_extra(&self, extension_id: &ExtensionId, row_id: &str) -> bool {
        self.extras_for(extension_id).iter().any(|r| r == row_id)
    }

    /// Selected rows of one extension.
    #[must_use]
    pub fn extras_for(&self, extension_id: &ExtensionId) -> &[String] {
        self.extras
            .get(extension_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All selected extension rows, keyed by extension id.
    #[must_use]
    pub fn extras(&self) -> &BTreeMap<ExtensionId, Vec<String>> {
        &self.extras
    }

    /// Content categories and their selected items.
    #[must_use]
    pub fn categories(&self) -> &BTreeMap<String, Vec<String>> {
        &self.categories
    }

    /// Content categories that have at least one selected item.
    pub fn non_empty_categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(name, items)| (name.as_str(), items.as_slice()))
    }

    /// `true` when nothing at all is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty) && self.extras.values().all(Vec::is_empty)
    }
}
