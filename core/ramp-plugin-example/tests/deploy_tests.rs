//! End-to-end deployments of the admin email between two environments.

use pretty_assertions::assert_eq;
use ramp_engine::{
    BatchCoordinator, BatchStage, BatchStatus, EngineConfig, LocalLink, ProductionResponder,
    Registry,
};
use ramp_extension::prelude::*;
use ramp_plugin_example::{AdminEmailExtension, OPTION_KEY, ROW_ID};
use ramp_storage::SqliteOptionStore;
use serde_json::json;
use std::sync::Arc;

struct Sites {
    _dir: tempfile::TempDir,
    staging: Arc<SqliteOptionStore>,
    production: Arc<SqliteOptionStore>,
}

impl Sites {
    fn new(staging_email: &str, production_email: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.db");
        let staging = Arc::new(SqliteOptionStore::open(&path, "staging").unwrap());
        let production = Arc::new(SqliteOptionStore::open(&path, "production").unwrap());
        staging.set(OPTION_KEY, json!(staging_email)).unwrap();
        production.set(OPTION_KEY, json!(production_email)).unwrap();
        Self {
            _dir: dir,
            staging,
            production,
        }
    }

    fn coordinator(&self, batch: Batch) -> BatchCoordinator {
        let mut staging = Registry::new();
        staging
            .register(AdminEmailExtension::new(self.staging.clone()))
            .unwrap();
        let mut production = Registry::new();
        production
            .register(AdminEmailExtension::new(self.production.clone()))
            .unwrap();

        let responder = ProductionResponder::new(Arc::new(production), EngineConfig::production());
        BatchCoordinator::new(
            Arc::new(staging),
            Arc::new(LocalLink::new(Arc::new(responder))),
            EngineConfig::default(),
            batch,
        )
    }

    fn production_email(&self) -> Option<serde_json::Value> {
        self.production.get(OPTION_KEY).unwrap()
    }
}

fn rpe() -> ExtensionId {
    make_id(ramp_plugin_example::NAME)
}

#[tokio::test]
async fn differing_email_is_deployed() {
    let sites = Sites::new("new@example.com", "old@example.com");
    let mut c = sites.coordinator(Batch::new());

    let comparison = c.compare().await.unwrap();
    let row = comparison.row(&rpe(), ROW_ID).unwrap();
    assert!(row.remote_status.differ);
    assert_eq!(row.remote_status.detail("stage_rpe_config"), Some(&json!("new@example.com")));
    assert!(c.batch().contains_extra(&rpe(), ROW_ID));

    let preflight = c.preflight().await.unwrap();
    assert!(!preflight.blocked);
    assert_eq!(
        preflight.report.extra(&rpe()).unwrap().list(MessageKind::Message),
        ["The admin email will be updated.".to_string()]
    );

    let transfer = c.transfer().await.unwrap();
    assert!(transfer.success);
    assert_eq!(
        transfer.outcome(&rpe()).unwrap().result.message,
        "RAMP plugin example changes made: updated the admin email"
    );
    assert_eq!(sites.production_email(), Some(json!("new@example.com")));
    assert_eq!(c.report().status(), BatchStatus::Succeeded);
}

#[tokio::test]
async fn matching_email_produces_nothing_to_transfer() {
    let sites = Sites::new("same@example.com", "same@example.com");
    let mut c = sites.coordinator(Batch::new());

    let comparison = c.compare().await.unwrap();
    let row = comparison.row(&rpe(), ROW_ID).unwrap();
    assert!(!row.remote_status.differ);
    assert_eq!(row.selection.selected, None);
    assert!(c.batch().extras_for(&rpe()).is_empty());

    let preflight = c.preflight().await.unwrap();
    assert_eq!(preflight.skipped, vec![rpe()]);

    let transfer = c.transfer().await.unwrap();
    assert!(transfer.outcomes.is_empty());
    assert!(transfer.success);
    assert_eq!(sites.production_email(), Some(json!("same@example.com")));
}

#[tokio::test]
async fn email_mixed_with_other_content_is_blocked() {
    let sites = Sites::new("new@example.com", "old@example.com");
    let mut batch = Batch::new();
    batch.select("post_types", "42");
    let mut c = sites.coordinator(batch);

    c.compare().await.unwrap();
    let preflight = c.preflight().await.unwrap();

    assert!(preflight.blocked);
    let errors = preflight.report.extra(&rpe()).unwrap().list(MessageKind::Error);
    assert_eq!(errors, ["Batch contains items in post_types".to_string()]);
    assert_eq!(c.stage(), BatchStage::Blocked);
    assert_eq!(sites.production_email(), Some(json!("old@example.com")));
}

#[tokio::test]
async fn deselected_email_is_not_sent() {
    let sites = Sites::new("new@example.com", "old@example.com");
    let mut c = sites.coordinator(Batch::new());

    c.compare().await.unwrap();
    c.set_selected(&rpe(), ROW_ID, false).unwrap();
    c.preflight().await.unwrap();
    let transfer = c.transfer().await.unwrap();

    assert!(transfer.outcomes.is_empty());
    assert_eq!(sites.production_email(), Some(json!("old@example.com")));
}
