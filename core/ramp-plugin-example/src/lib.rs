//! Example RAMP extension: deploys the `admin_email` setting.
//!
//! Fills all eight callback slots. The comparison and preflight stages reuse
//! `send` (forced during comparison, batch-driven during preflight), and the
//! preflight check insists the email travel in a batch of its own.

use ramp_extension::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Registered name; the extension id is derived from it.
pub const NAME: &str = "RAMP Plugin Example";

/// Option holding the admin email on each environment.
pub const OPTION_KEY: &str = "admin_email";

/// The single comparison row this extension produces.
pub const ROW_ID: &str = "rpe_config";

const DESCRIPTION: &str = "Demonstrates how to integrate with RAMP by sending the admin email setting";

/// Deploys the admin email from staging to production.
pub struct AdminEmailExtension {
    id: ExtensionId,
    store: Arc<dyn OptionStore>,
}

impl AdminEmailExtension {
    pub fn new(store: Arc<dyn OptionStore>) -> Self {
        Self {
            id: make_id(NAME),
            store,
        }
    }

    pub fn id(&self) -> &ExtensionId {
        &self.id
    }

    /// Current local value; `null` when unset.
    fn current(&self) -> CallbackResult<Value> {
        Ok(self.store.get(OPTION_KEY)?.unwrap_or(Value::Null))
    }
}

impl DeployExtension for AdminEmailExtension {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::all()
    }

    // ── Comparison ───────────────────────────────────────────────

    fn comparison_send(&self, batch: &Batch) -> CallbackResult<RowMap> {
        match self.send(batch, SendMode::Forced)? {
            Some(payload) => Ok(serde_json::from_value(payload)?),
            None => Ok(RowMap::new()),
        }
    }

    fn comparison_check(
        &self,
        rows: &StagedRows,
        _compiled: &CompiledComparison,
    ) -> CallbackResult<RemoteStatuses> {
        let production = self.current()?;
        let staging = rows
            .get(ROW_ID)
            .map(|row| row.status.clone())
            .unwrap_or(Value::Null);

        let status = if staging == production {
            RemoteStatus::same()
        } else {
            RemoteStatus::differs()
                .with_detail(ROW_ID, production)
                .with_detail(format!("stage_{ROW_ID}"), staging)
        };
        Ok(RemoteStatuses::from([(ROW_ID.to_string(), status)]))
    }

    fn comparison_selection_row(&self, input: &SelectionRowInput) -> CallbackResult<SelectionRow> {
        if input.remote_status.differ {
            Ok(SelectionRow {
                selected: Some(true),
                forced: false,
                title: NAME.to_string(),
                message: DESCRIPTION.to_string(),
            })
        } else {
            Ok(SelectionRow::informational(
                NAME,
                format!("{DESCRIPTION} (no differences found)"),
            ))
        }
    }

    // ── Preflight ────────────────────────────────────────────────

    fn preflight_send(&self, batch: &Batch) -> CallbackResult<Option<Value>> {
        self.send(batch, SendMode::Batch)
    }

    fn preflight_check(&self, data: &Value, batch: &Batch) -> CallbackResult<PreflightRow> {
        let mut row = PreflightRow::new();
        let incoming = data.get(ROW_ID).unwrap_or(data);
        if *incoming == self.current()? {
            return Ok(row);
        }

        // The email has to travel alone.
        let mut errors: Vec<String> = batch
            .non_empty_categories()
            .map(|(category, _)| format!("Batch contains items in {category}"))
            .collect();
        errors.extend(
            batch
                .extras()
                .keys()
                .filter(|id| **id != self.id)
                .map(|id| format!("Batch contains items in {EXTRAS}/{id}")),
        );

        if !errors.is_empty() {
            row.push(
                MessageKind::Notice,
                "The admin email must, as an example, be sent separately from any other batch items",
            );
        }
        row.push(MessageKind::Message, "The admin email will be updated.");
        row.errors = errors;
        Ok(row)
    }

    fn preflight_display(
        &self,
        report: &PreflightReport,
        edits: &mut ReportEdits,
    ) -> CallbackResult<()> {
        let Some(post) = report.row("post_types", "post") else {
            return Ok(());
        };
        for (key, sub) in &post.rows {
            let path = RowPath::new("post_types", "post").child(key.clone());
            if sub.errors.is_empty() {
                edits.replace(path, MessageKind::Notice, vec!["Creating a notice for a post.".into()]);
            } else {
                edits.append(path, MessageKind::Notice, "(Adding a notice to a post's message.)");
            }
        }
        Ok(())
    }

    // ── Transfer ─────────────────────────────────────────────────

    fn send(&self, batch: &Batch, mode: SendMode) -> CallbackResult<Option<Value>> {
        let selected = batch.extras_for(&self.id).iter().any(|row| row == ROW_ID);
        if !mode.is_forced() && !selected {
            debug!(extension_id = %self.id, "Admin email not in batch");
            return Ok(None);
        }
        Ok(Some(json!({ ROW_ID: self.current()? })))
    }

    fn receive(&self, data: &Value) -> CallbackResult<TransferResult> {
        let incoming = data
            .get(ROW_ID)
            .ok_or_else(|| CallbackError::InvalidInput(format!("payload has no '{ROW_ID}'")))?;

        if *incoming == self.current()? {
            return Ok(TransferResult::ok("No RAMP plugin example changes to deploy"));
        }

        self.store.set(OPTION_KEY, incoming.clone())?;
        info!(extension_id = %self.id, "Admin email updated");
        Ok(TransferResult::ok(
            "RAMP plugin example changes made: updated the admin email",
        ))
    }
}
