//! Preflight report tree.
//!
//! A report maps category → row name → [`PreflightRow`]. Rows carry four
//! message lists and may nest sub-rows to any depth. Only `__error__`
//! entries block a batch.

use crate::fault::Fault;
use crate::ids::ExtensionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The four kinds of preflight message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Message,
    Notice,
    Warning,
    Error,
}

impl MessageKind {
    /// Only errors stop a batch.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, MessageKind::Error)
    }

    /// Key used in the serialized report.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            MessageKind::Message => "__message__",
            MessageKind::Notice => "__notice__",
            MessageKind::Warning => "__warning__",
            MessageKind::Error => "__error__",
        }
    }
}

/// Messages for one row, plus optional sub-rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightRow {
    #[serde(rename = "__message__", default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
    #[serde(rename = "__notice__", default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
    #[serde(rename = "__warning__", default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(rename = "__error__", default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rows: BTreeMap<String, PreflightRow>,
}

impl PreflightRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, kind: MessageKind) -> &[String] {
        match kind {
            MessageKind::Message => &self.messages,
            MessageKind::Notice => &self.notices,
            MessageKind::Warning => &self.warnings,
            MessageKind::Error => &self.errors,
        }
    }

    pub fn list_mut(&mut self, kind: MessageKind) -> &mut Vec<String> {
        match kind {
            MessageKind::Message => &mut self.messages,
            MessageKind::Notice => &mut self.notices,
            MessageKind::Warning => &mut self.warnings,
            MessageKind::Error => &mut self.errors,
        }
    }

    pub fn push(&mut self, kind: MessageKind, text: impl Into<String>) {
        self.list_mut(kind).push(text.into());
    }

    /// Builder-style [`PreflightRow::push`].
    #[must_use]
    pub fn with(mut self, kind: MessageKind, text: impl Into<String>) -> Self {
        self.push(kind, text);
        self
    }

    /// Builder-style sub-row insertion.
    #[must_use]
    pub fn with_row(mut self, name: impl Into<String>, row: PreflightRow) -> Self {
        self.rows.insert(name.into(), row);
        self
    }

    /// `true` if this row or any sub-row, at any depth, has an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.rows.values().any(PreflightRow::has_errors)
    }

    /// Total number of errors in this row and its sub-rows.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len() + self.rows.values().map(PreflightRow::error_count).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
            && self.notices.is_empty()
            && self.warnings.is_empty()
            && self.errors.is_empty()
            && self.rows.is_empty()
    }

    fn collect_errors(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        for e in &self.errors {
            out.push((prefix.to_string(), e.clone()));
        }
        for (name, row) in &self.rows {
            row.collect_errors(&format!("{prefix}/{name}"), out);
        }
    }
}

/// Address of a row (or sub-row) inside a [`PreflightReport`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowPath {
    pub category: String,
    pub row: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_rows: Vec<String>,
}

impl RowPath {
    pub fn new(category: impl Into<String>, row: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            row: row.into(),
            sub_rows: Vec::new(),
        }
    }

    /// Path of an extension's own row under `extras`.
    pub fn extra(extension_id: &ExtensionId) -> Self {
        Self::new(crate::batch::EXTRAS, extension_id.as_str())
    }

    /// Descends into a sub-row.
    #[must_use]
    pub fn child(mut self, name: impl Into<String>) -> Self {
        self.sub_rows.push(name.into());
        self
    }
}

impl fmt::Display for RowPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.row)?;
        for sub in &self.sub_rows {
            write!(f, "/{sub}")?;
        }
        Ok(())
    }
}

/// How an edit changes a message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOp {
    Append(String),
    Replace(Vec<String>),
}

/// One change requested by a preflight-display callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEdit {
    pub path: RowPath,
    pub kind: MessageKind,
    pub op: EditOp,
}

/// A [`ReportEdit`] together with the extension that made it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributedEdit {
    pub extension_id: ExtensionId,
    #[serde(flatten)]
    pub edit: ReportEdit,
}

/// The compiled preflight report for a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreflightReport {
    categories: BTreeMap<String, BTreeMap<String, PreflightRow>>,
}

impl PreflightReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the row at `category/name`.
    pub fn insert(&mut self, category: impl Into<String>, name: impl Into<String>, row: PreflightRow) {
        self.categories
            .entry(category.into())
            .or_default()
            .insert(name.into(), row);
    }

    pub fn row(&self, category: &str, name: &str) -> Option<&PreflightRow> {
        self.categories.get(category)?.get(name)
    }

    /// Row of one extension under `extras`.
    pub fn extra(&self, extension_id: &ExtensionId) -> Option<&PreflightRow> {
        self.row(crate::batch::EXTRAS, extension_id.as_str())
    }

    /// Rows of one category.
    pub fn category(&self, category: &str) -> Option<&BTreeMap<String, PreflightRow>> {
        self.categories.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, PreflightRow>)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Looks up a row or sub-row.
    pub fn resolve(&self, path: &RowPath) -> Option<&PreflightRow> {
        let mut row = self.row(&path.category, &path.row)?;
        for sub in &path.sub_rows {
            row = row.rows.get(sub)?;
        }
        Some(row)
    }

    /// Looks up a row or sub-row, creating every missing level.
    pub fn resolve_mut(&mut self, path: &RowPath) -> &mut PreflightRow {
        let mut row = self
            .categories
            .entry(path.category.clone())
            .or_default()
            .entry(path.row.clone())
            .or_default();
        for sub in &path.sub_rows {
            row = row.rows.entry(sub.clone()).or_default();
        }
        row
    }

    /// Applies one display edit.
    pub fn apply(&mut self, edit: &ReportEdit) {
        let list = self.resolve_mut(&edit.path).list_mut(edit.kind);
        match &edit.op {
            EditOp::Append(text) => list.push(text.clone()),
            EditOp::Replace(texts) => *list = texts.clone(),
        }
    }

    /// `true` if any row at any depth carries an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.categories
            .values()
            .flat_map(BTreeMap::values)
            .any(PreflightRow::has_errors)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.categories
            .values()
            .flat_map(BTreeMap::values)
            .map(PreflightRow::error_count)
            .sum()
    }

    /// Every error with the path of the row that carries it.
    pub fn errors(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (category, rows) in &self.categories {
            for (name, row) in rows {
                row.collect_errors(&format!("{category}/{name}"), &mut out);
            }
        }
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(BTreeMap::is_empty)
    }
}

/// Result of one preflight pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightOutcome {
    pub report: PreflightReport,
    pub faults: Vec<Fault>,
    /// Display edits in the order they were applied.
    pub edits: Vec<AttributedEdit>,
    /// Extensions whose preflight-send produced nothing.
    pub skipped: Vec<ExtensionId>,
    pub blocked: bool,
}
