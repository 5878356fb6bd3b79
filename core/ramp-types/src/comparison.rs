//! Types exchanged during the "new batch" comparison.
//!
//! Staging produces [`StagedRow`]s, production answers each with a
//! [`RemoteStatus`], and staging turns the pair into a [`SelectionRow`] the
//! operator can tick.

use crate::fault::Fault;
use crate::ids::ExtensionId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Rows returned by a comparison-send callback, keyed by row id.
pub type RowMap = BTreeMap<String, Value>;

/// Staged rows of one extension, keyed by row id.
pub type StagedRows = BTreeMap<String, StagedRow>;

/// Staged rows of every extension, as sent to production.
pub type CompiledComparison = BTreeMap<ExtensionId, StagedRows>;

/// Verdicts of one extension, keyed by row id.
pub type RemoteStatuses = BTreeMap<String, RemoteStatus>;

/// One comparison-send row as it travels to production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedRow {
    pub status: Value,
}

impl StagedRow {
    pub fn new(status: Value) -> Self {
        Self { status }
    }
}

/// Production's verdict on one staged row.
///
/// `differ` is the only required field; extensions add whatever detail they
/// need for the selection row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub differ: bool,
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

impl RemoteStatus {
    /// A verdict saying production matches staging.
    #[must_use]
    pub fn same() -> Self {
        Self {
            differ: false,
            detail: Map::new(),
        }
    }

    /// A verdict saying production differs from staging.
    #[must_use]
    pub fn differs() -> Self {
        Self {
            differ: true,
            detail: Map::new(),
        }
    }

    /// Adds a detail field.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.detail.insert(key.into(), value);
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.detail.get(key)
    }
}

/// Everything the selection-row callback gets to see about one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRowInput {
    pub status: Value,
    pub remote_status: RemoteStatus,
    pub id: ExtensionId,
    pub extra_id: String,
    pub in_batch: bool,
}

/// How a comparison row is presented on the new-batch screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRow {
    /// `None` renders the row without a checkbox.
    pub selected: Option<bool>,
    /// Disables the checkbox.
    #[serde(default)]
    pub forced: bool,
    pub title: String,
    pub message: String,
}

impl SelectionRow {
    /// An informational row without a checkbox.
    pub fn informational(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            selected: None,
            forced: false,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Checks the row contract: a forced row must carry a checkbox state.
    pub fn validate(&self) -> Result<(), String> {
        if self.forced && self.selected.is_none() {
            return Err("forced row has no checkbox state".into());
        }
        Ok(())
    }

    /// Whether the operator may toggle this row.
    #[must_use]
    pub fn is_user_editable(&self) -> bool {
        self.selected.is_some() && !self.forced
    }
}

/// One diff entry on the new-batch screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub extension_id: ExtensionId,
    pub row_id: String,
    pub status: Value,
    pub remote_status: RemoteStatus,
    #[serde(flatten)]
    pub selection: SelectionRow,
}

/// Result of one comparison pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub rows: Vec<ComparisonRow>,
    pub faults: Vec<Fault>,
}

impl ComparisonReport {
    /// Rows produced by one extension.
    pub fn rows_for<'a>(
        &'a self,
        extension_id: &ExtensionId,
    ) -> impl Iterator<Item = &'a ComparisonRow> + use<'a> {
        let extension_id = extension_id.clone();
        self.rows
            .iter()
            .filter(move |r| r.extension_id == extension_id)
    }

    pub fn row(&self, extension_id: &ExtensionId, row_id: &str) -> Option<&ComparisonRow> {
        self.rows
            .iter()
            .find(|r| &r.extension_id == extension_id && r.row_id == row_id)
    }

    /// Faults attributed to one extension.
    pub fn faults_for<'a>(
        &'a self,
        extension_id: &ExtensionId,
    ) -> impl Iterator<Item = &'a Fault> + use<'a> {
        let extension_id = extension_id.clone();
        self.faults
            .iter()
            .filter(move |f| f.extension_id == extension_id)
    }

    #[must_use]
    pub fn is_faulted(&self, extension_id: &ExtensionId) -> bool {
        self.faults_for(extension_id).next().is_some()
    }
}
