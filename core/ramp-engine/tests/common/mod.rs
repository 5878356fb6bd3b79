//! Shared fixtures for engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ramp_engine::{
    DeployEnvelope, DeployError, DeployResponse, DeployResult, EngineConfig, LocalLink,
    ProductionLink, ProductionResponder, Registry,
};
use ramp_extension::prelude::*;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a scripted slot misbehaves.
#[derive(Debug, Clone, Copy)]
pub enum Mode {
    Fail,
    Panic,
    Sleep(Duration),
}

/// Records which slots were called and what `receive` was handed.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Capability>>>,
    received: Arc<Mutex<Vec<Value>>>,
}

impl CallLog {
    fn record(&self, capability: Capability) {
        self.calls.lock().unwrap().push(capability);
    }

    pub fn count(&self, capability: Capability) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == capability)
            .count()
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

/// A configurable extension. Every slot returns canned data unless a
/// [`Mode`] is set for it.
#[derive(Clone)]
pub struct TestExtension {
    name: String,
    capabilities: CapabilitySet,
    faults: Vec<(Capability, Mode)>,
    rows: RowMap,
    differ: bool,
    forced: bool,
    selection: Option<SelectionRow>,
    send_payload: Option<Value>,
    preflight_payload: Option<Value>,
    preflight_row: PreflightRow,
    receive_result: TransferResult,
    display_edits: Vec<(RowPath, MessageKind, String)>,
    log: CallLog,
}

impl TestExtension {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            capabilities: CapabilitySet::empty(),
            faults: Vec::new(),
            rows: RowMap::new(),
            differ: false,
            forced: false,
            selection: None,
            send_payload: None,
            preflight_payload: None,
            preflight_row: PreflightRow::new(),
            receive_result: TransferResult::ok("received"),
            display_edits: Vec::new(),
            log: CallLog::default(),
        }
    }

    pub fn declare(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        for c in capabilities {
            self.capabilities = self.capabilities.with(c);
        }
        self
    }

    pub fn all_slots(mut self) -> Self {
        self.capabilities = CapabilitySet::all();
        self
    }

    pub fn fault(mut self, capability: Capability, mode: Mode) -> Self {
        self.faults.push((capability, mode));
        self
    }

    pub fn row(mut self, id: &str, status: Value) -> Self {
        self.rows.insert(id.to_string(), status);
        self
    }

    pub fn differ(mut self, differ: bool) -> Self {
        self.differ = differ;
        self
    }

    pub fn forced(mut self) -> Self {
        self.forced = true;
        self
    }

    pub fn selection(mut self, row: SelectionRow) -> Self {
        self.selection = Some(row);
        self
    }

    pub fn sends(mut self, payload: Value) -> Self {
        self.send_payload = Some(payload);
        self
    }

    pub fn preflight_sends(mut self, payload: Value) -> Self {
        self.preflight_payload = Some(payload);
        self
    }

    pub fn preflight_row(mut self, row: PreflightRow) -> Self {
        self.preflight_row = row;
        self
    }

    pub fn receive_result(mut self, result: TransferResult) -> Self {
        self.receive_result = result;
        self
    }

    pub fn display(mut self, path: RowPath, kind: MessageKind, text: &str) -> Self {
        self.display_edits.push((path, kind, text.to_string()));
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn enter(&self, capability: Capability) -> CallbackResult<()> {
        self.log.record(capability);
        match self.faults.iter().find(|(c, _)| *c == capability) {
            Some((_, Mode::Fail)) => Err(CallbackError::failed(format!("{capability} exploded"))),
            Some((_, Mode::Panic)) => panic!("{capability} panicked"),
            Some((_, Mode::Sleep(d))) => {
                std::thread::sleep(*d);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl DeployExtension for TestExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Scripted test extension"
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    fn send(&self, _batch: &Batch, _mode: SendMode) -> CallbackResult<Option<Value>> {
        self.enter(Capability::Send)?;
        Ok(self.send_payload.clone())
    }

    fn receive(&self, data: &Value) -> CallbackResult<TransferResult> {
        self.enter(Capability::Receive)?;
        self.log.received.lock().unwrap().push(data.clone());
        Ok(self.receive_result.clone())
    }

    fn preflight_send(&self, _batch: &Batch) -> CallbackResult<Option<Value>> {
        self.enter(Capability::PreflightSend)?;
        Ok(self.preflight_payload.clone())
    }

    fn preflight_check(&self, _data: &Value, _batch: &Batch) -> CallbackResult<PreflightRow> {
        self.enter(Capability::PreflightCheck)?;
        Ok(self.preflight_row.clone())
    }

    fn preflight_display(
        &self,
        _report: &PreflightReport,
        edits: &mut ReportEdits,
    ) -> CallbackResult<()> {
        self.enter(Capability::PreflightDisplay)?;
        for (path, kind, text) in &self.display_edits {
            edits.append(path.clone(), *kind, text.clone());
        }
        Ok(())
    }

    fn comparison_send(&self, _batch: &Batch) -> CallbackResult<RowMap> {
        self.enter(Capability::ComparisonSend)?;
        Ok(self.rows.clone())
    }

    fn comparison_check(
        &self,
        rows: &StagedRows,
        _compiled: &CompiledComparison,
    ) -> CallbackResult<RemoteStatuses> {
        self.enter(Capability::ComparisonCheck)?;
        Ok(rows
            .keys()
            .map(|id| {
                let status = if self.differ {
                    RemoteStatus::differs()
                } else {
                    RemoteStatus::same()
                };
                (id.clone(), status)
            })
            .collect())
    }

    fn comparison_selection_row(&self, input: &SelectionRowInput) -> CallbackResult<SelectionRow> {
        self.enter(Capability::ComparisonSelectionRow)?;
        if let Some(row) = &self.selection {
            return Ok(row.clone());
        }
        Ok(SelectionRow {
            selected: Some(input.in_batch || input.remote_status.differ),
            forced: self.forced,
            title: self.name.clone(),
            message: if input.remote_status.differ {
                "differs".to_string()
            } else {
                "same".to_string()
            },
        })
    }
}

pub fn registry(extensions: Vec<TestExtension>) -> Arc<Registry> {
    let mut registry = Registry::new();
    for ext in extensions {
        registry.register(ext).unwrap();
    }
    Arc::new(registry)
}

/// A batch with the `config` row of each named extension selected.
pub fn batch_of(names: &[&str]) -> Batch {
    let mut batch = Batch::new();
    for name in names {
        batch.select_extra(&ExtensionId::from(*name), "config");
    }
    batch
}

pub fn local_link(production: Arc<Registry>) -> Arc<dyn ProductionLink> {
    let responder = ProductionResponder::new(production, EngineConfig::production());
    Arc::new(LocalLink::new(Arc::new(responder)))
}

/// Returns a fixed response to every request.
pub struct CannedLink(pub DeployResponse);

#[async_trait]
impl ProductionLink for CannedLink {
    async fn call(&self, _envelope: DeployEnvelope) -> DeployResult<DeployResponse> {
        Ok(self.0.clone())
    }
}

/// Forwards to an inner link unless switched off.
pub struct FlakyLink {
    inner: Arc<dyn ProductionLink>,
    down: AtomicBool,
}

impl FlakyLink {
    pub fn new(inner: Arc<dyn ProductionLink>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            down: AtomicBool::new(false),
        })
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductionLink for FlakyLink {
    async fn call(&self, envelope: DeployEnvelope) -> DeployResult<DeployResponse> {
        if self.down.load(Ordering::SeqCst) {
            return Err(DeployError::Transport("connection refused".into()));
        }
        self.inner.call(envelope).await
    }
}

/// Never answers within any reasonable deadline.
pub struct StalledLink;

#[async_trait]
impl ProductionLink for StalledLink {
    async fn call(&self, _envelope: DeployEnvelope) -> DeployResult<DeployResponse> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Err(DeployError::Transport("unreachable".into()))
    }
}

pub fn fast_config() -> EngineConfig {
    EngineConfig {
        callback_timeout_ms: 50,
        remote_timeout_ms: 200,
        ..EngineConfig::default()
    }
}
