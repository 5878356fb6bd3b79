//! Callback-level behavior of the admin email extension.

use pretty_assertions::assert_eq;
use ramp_extension::prelude::*;
use ramp_plugin_example::{AdminEmailExtension, OPTION_KEY, ROW_ID};
use serde_json::{json, Value};
use std::sync::Arc;

fn extension(email: &str) -> (AdminEmailExtension, Arc<MemoryOptionStore>) {
    let store = Arc::new(MemoryOptionStore::new().with_option(OPTION_KEY, json!(email)));
    (AdminEmailExtension::new(store.clone()), store)
}

fn staged(value: Value) -> StagedRows {
    StagedRows::from([(ROW_ID.to_string(), StagedRow::new(value))])
}

fn own_row(batch: &mut Batch, ext: &AdminEmailExtension) {
    batch.select_extra(ext.id(), ROW_ID);
}

// ================================================================
// Identity
// ================================================================

#[test]
fn id_is_derived_from_name() {
    let (ext, _) = extension("a@example.com");
    assert_eq!(ext.id().as_str(), "ramp-plugin-example");
    assert_eq!(ext.capabilities(), CapabilitySet::all());
}

// ================================================================
// Transfer
// ================================================================

#[test]
fn receive_is_idempotent() {
    let (ext, store) = extension("same@example.com");

    let result = ext.receive(&json!({ "rpe_config": "same@example.com" })).unwrap();

    assert!(result.success);
    assert_eq!(result.message, "No RAMP plugin example changes to deploy");
    assert_eq!(store.get(OPTION_KEY).unwrap(), Some(json!("same@example.com")));
}

#[test]
fn receive_updates_a_differing_email() {
    let (ext, store) = extension("old@example.com");

    let result = ext.receive(&json!({ "rpe_config": "new@example.com" })).unwrap();

    assert!(result.success);
    assert_eq!(result.message, "RAMP plugin example changes made: updated the admin email");
    assert_eq!(store.get(OPTION_KEY).unwrap(), Some(json!("new@example.com")));

    let again = ext.receive(&json!({ "rpe_config": "new@example.com" })).unwrap();
    assert_eq!(again.message, "No RAMP plugin example changes to deploy");
}

#[test]
fn receive_rejects_payload_without_row() {
    let (ext, _) = extension("a@example.com");
    let err = ext.receive(&json!({ "other": 1 })).unwrap_err();
    assert!(matches!(err, CallbackError::InvalidInput(_)));
}

#[test]
fn send_skips_when_row_not_selected() {
    let (ext, _) = extension("a@example.com");
    assert_eq!(ext.send(&Batch::new(), SendMode::Batch).unwrap(), None);
}

#[test]
fn send_includes_selected_or_forced_row() {
    let (ext, _) = extension("a@example.com");
    let expected = Some(json!({ "rpe_config": "a@example.com" }));

    assert_eq!(ext.send(&Batch::new(), SendMode::Forced).unwrap(), expected);

    let mut batch = Batch::new();
    own_row(&mut batch, &ext);
    assert_eq!(ext.send(&batch, SendMode::Batch).unwrap(), expected);
}

// ================================================================
// Comparison
// ================================================================

#[test]
fn comparison_send_always_produces_the_row() {
    let (ext, _) = extension("a@example.com");
    let rows = ext.comparison_send(&Batch::new()).unwrap();
    assert_eq!(rows.get(ROW_ID), Some(&json!("a@example.com")));
}

#[test]
fn equal_values_do_not_differ() {
    let (prod, _) = extension("same@example.com");
    let rows = staged(json!("same@example.com"));

    let statuses = prod.comparison_check(&rows, &CompiledComparison::new()).unwrap();

    let status = &statuses[ROW_ID];
    assert!(!status.differ);
    assert!(status.detail(ROW_ID).is_none());
}

#[test]
fn differing_values_carry_both_sides() {
    let (prod, _) = extension("prod@example.com");
    let rows = staged(json!("stage@example.com"));

    let statuses = prod.comparison_check(&rows, &CompiledComparison::new()).unwrap();

    let status = &statuses[ROW_ID];
    assert!(status.differ);
    assert_eq!(status.detail("rpe_config"), Some(&json!("prod@example.com")));
    assert_eq!(status.detail("stage_rpe_config"), Some(&json!("stage@example.com")));
}

#[test]
fn selection_row_checks_only_differences() {
    let (ext, _) = extension("a@example.com");
    let mut input = SelectionRowInput {
        status: json!("a@example.com"),
        remote_status: RemoteStatus::differs(),
        id: ext.id().clone(),
        extra_id: ROW_ID.to_string(),
        in_batch: false,
    };

    let row = ext.comparison_selection_row(&input).unwrap();
    assert_eq!(row.selected, Some(true));
    assert!(!row.forced);
    assert_eq!(row.title, "RAMP Plugin Example");

    input.remote_status = RemoteStatus::same();
    let row = ext.comparison_selection_row(&input).unwrap();
    assert_eq!(row.selected, None);
    assert!(row.message.ends_with(" (no differences found)"));
}

// ================================================================
// Preflight
// ================================================================

#[test]
fn preflight_is_quiet_when_email_matches() {
    let (ext, _) = extension("same@example.com");
    let row = ext
        .preflight_check(&json!({ "rpe_config": "same@example.com" }), &Batch::new())
        .unwrap();
    assert!(row.is_empty());
}

#[test]
fn preflight_announces_update_when_alone() {
    let (ext, _) = extension("old@example.com");
    let mut batch = Batch::new();
    own_row(&mut batch, &ext);

    let row = ext
        .preflight_check(&json!({ "rpe_config": "new@example.com" }), &batch)
        .unwrap();

    assert!(!row.has_errors());
    assert_eq!(row.list(MessageKind::Message), ["The admin email will be updated.".to_string()]);
    assert!(row.list(MessageKind::Notice).is_empty());
}

#[test]
fn batch_file_keyed_by_name_selects_the_row() {
    let (ext, _) = extension("new@example.com");
    let batch = Batch::from_json(r#"{"extras": {"RAMP Plugin Example": ["rpe_config"]}}"#).unwrap();

    let sent = ext.send(&batch, SendMode::Batch).unwrap();
    assert_eq!(sent, Some(json!({ "rpe_config": "new@example.com" })));

    let row = ext
        .preflight_check(&json!({ "rpe_config": "old@example.com" }), &batch)
        .unwrap();
    assert!(!row.has_errors());
}

#[test]
fn preflight_errors_when_batch_carries_other_items() {
    let (ext, _) = extension("old@example.com");
    let mut batch = Batch::new();
    own_row(&mut batch, &ext);
    batch.select("post_types", "42");
    batch.select_extra(&ExtensionId::from("menus"), "main");

    let row = ext
        .preflight_check(&json!({ "rpe_config": "new@example.com" }), &batch)
        .unwrap();

    assert_eq!(
        row.list(MessageKind::Error),
        [
            "Batch contains items in post_types".to_string(),
            "Batch contains items in extras/menus".to_string(),
        ]
    );
    assert_eq!(
        row.list(MessageKind::Notice),
        ["The admin email must, as an example, be sent separately from any other batch items".to_string()]
    );
}

#[test]
fn display_marks_post_rows() {
    let (ext, _) = extension("a@example.com");
    let post = PreflightRow::new()
        .with_row("1", PreflightRow::new().with(MessageKind::Error, "broken"))
        .with_row("2", PreflightRow::new().with(MessageKind::Notice, "old notice"));
    let mut report = PreflightReport::new();
    report.insert("post_types", "post", post);

    let mut edits = ReportEdits::new();
    ext.preflight_display(&report, &mut edits).unwrap();
    edits.apply_to(&mut report);

    let post = report.row("post_types", "post").unwrap();
    assert_eq!(
        post.rows["1"].list(MessageKind::Notice),
        ["(Adding a notice to a post's message.)".to_string()]
    );
    assert_eq!(
        post.rows["2"].list(MessageKind::Notice),
        ["Creating a notice for a post.".to_string()]
    );
}

#[test]
fn display_ignores_reports_without_posts() {
    let (ext, _) = extension("a@example.com");
    let mut edits = ReportEdits::new();
    ext.preflight_display(&PreflightReport::new(), &mut edits).unwrap();
    assert!(edits.is_empty());
}
