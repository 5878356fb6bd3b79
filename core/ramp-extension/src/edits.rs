//! Accumulator handed to preflight-display callbacks.
//!
//! Display callbacks see a read-only snapshot of the compiled report and
//! record their changes here. The engine applies them once the callback has
//! returned.

use ramp_types::{EditOp, MessageKind, PreflightReport, ReportEdit, RowPath};

/// Changes requested by one preflight-display callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportEdits {
    edits: Vec<ReportEdit>,
}

impl ReportEdits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` to the `kind` list of the row at `path`.
    pub fn append(&mut self, path: RowPath, kind: MessageKind, text: impl Into<String>) {
        self.edits.push(ReportEdit {
            path,
            kind,
            op: EditOp::Append(text.into()),
        });
    }

    /// Replaces the `kind` list of the row at `path`.
    pub fn replace(&mut self, path: RowPath, kind: MessageKind, texts: Vec<String>) {
        self.edits.push(ReportEdit {
            path,
            kind,
            op: EditOp::Replace(texts),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportEdit> {
        self.edits.iter()
    }

    /// Applies every edit, in order, to `report`.
    pub fn apply_to(&self, report: &mut PreflightReport) {
        for edit in &self.edits {
            report.apply(edit);
        }
    }

    pub fn into_edits(self) -> Vec<ReportEdit> {
        self.edits
    }
}
