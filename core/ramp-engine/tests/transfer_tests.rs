//! Transfer engine: skip-on-empty, aggregation, partial failure.

mod common;

use common::{batch_of, local_link, registry, Mode, TestExtension};
use pretty_assertions::assert_eq;
use ramp_engine::{EngineConfig, LocalLink, ProductionResponder, TransferEngine};
use ramp_extension::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn pair(name: &str, payload: Value) -> (TestExtension, TestExtension) {
    let staging = TestExtension::new(name).declare([Capability::Send]).sends(payload);
    let production = TestExtension::new(name).declare([Capability::Receive]);
    (staging, production)
}

#[tokio::test]
async fn payload_reaches_receive() {
    let (s, p) = pair("Mover", json!({ "rpe_config": "ops@example.com" }));
    let log = p.log();
    let engine = TransferEngine::new(registry(vec![s]), local_link(registry(vec![p])), EngineConfig::default());

    let report = engine.run(&batch_of(&["Mover"])).await.unwrap();

    assert!(report.success);
    assert_eq!(log.received(), vec![json!({ "rpe_config": "ops@example.com" })]);
    let outcome = report.outcome(&ExtensionId::from("mover")).unwrap();
    assert_eq!(outcome.name, "Mover");
    assert_eq!(outcome.result.message, "received");
}

#[tokio::test]
async fn unselected_extension_is_never_sent() {
    let (s, p) = pair("Mover", json!({ "k": "v" }));
    let log = p.log();
    let staging_log = s.log();
    let engine = TransferEngine::new(registry(vec![s]), local_link(registry(vec![p])), EngineConfig::default());

    let mut batch = batch_of(&["Someone Else"]);
    batch.select("post_types", "42");
    let report = engine.run(&batch).await.unwrap();

    assert_eq!(staging_log.count(Capability::Send), 0);
    assert_eq!(log.count(Capability::Receive), 0);
    assert!(report.outcomes.is_empty());
    assert!(report.success);
}

#[tokio::test]
async fn receive_timeout_reports_unknown_outcome() {
    let (s, p) = pair("Slow", json!(1));
    let p = p.fault(Capability::Receive, Mode::Sleep(Duration::from_millis(300)));
    let config = EngineConfig {
        callback_timeout_ms: 50,
        ..EngineConfig::production()
    };
    let production = ProductionResponder::new(registry(vec![p]), config);
    let engine = TransferEngine::new(
        registry(vec![s]),
        Arc::new(LocalLink::new(Arc::new(production))),
        EngineConfig::default(),
    );

    let report = engine.run(&batch_of(&["Slow"])).await.unwrap();

    assert!(!report.success);
    assert_eq!(report.faults[0].capability, Capability::Receive);
    assert!(report.faults[0].message.contains("outcome unknown"), "{}", report.faults[0].message);
}

#[tokio::test]
async fn empty_send_never_calls_receive() {
    for empty in [Value::Null, json!(false), json!(""), json!([]), json!({})] {
        let (s, p) = pair("Idle", empty.clone());
        let log = p.log();
        let engine = TransferEngine::new(registry(vec![s]), local_link(registry(vec![p])), EngineConfig::default());

        let report = engine.run(&batch_of(&["Idle"])).await.unwrap();

        assert_eq!(log.count(Capability::Receive), 0, "payload {empty}");
        assert!(report.outcomes.is_empty());
        assert!(report.success);
    }
}

#[tokio::test]
async fn send_returning_none_is_skipped() {
    let staging = TestExtension::new("Nothing").declare([Capability::Send]);
    let production = TestExtension::new("Nothing").declare([Capability::Receive]);
    let log = production.log();
    let engine = TransferEngine::new(
        registry(vec![staging]),
        local_link(registry(vec![production])),
        EngineConfig::default(),
    );

    let report = engine.run(&batch_of(&["Nothing"])).await.unwrap();
    assert_eq!(log.count(Capability::Receive), 0);
    assert!(report.outcomes.is_empty());
}

#[tokio::test]
async fn one_failure_marks_the_transfer_partial() {
    let (s_a, p_a) = pair("A", json!(1));
    let (s_b, p_b) = pair("B", json!(2));
    let p_b = p_b.receive_result(TransferResult::failed("disk full"));
    let engine = TransferEngine::new(
        registry(vec![s_a, s_b]),
        local_link(registry(vec![p_a, p_b])),
        EngineConfig::default(),
    );

    let report = engine.run(&batch_of(&["A", "B"])).await.unwrap();

    assert!(!report.success);
    assert!(report.outcome(&ExtensionId::from("a")).unwrap().result.success);
    let failures: Vec<&str> = report.failures().map(|o| o.extension_id.as_str()).collect();
    assert_eq!(failures, vec!["b"]);
    assert!(report.faults.is_empty());
}

#[tokio::test]
async fn faults_on_either_side_become_failed_outcomes() {
    let (s_a, p_a) = pair("A", json!(1));
    let (s_b, p_b) = pair("B", json!(2));
    let (s_c, p_c) = pair("C", json!(3));
    let engine = TransferEngine::new(
        registry(vec![s_a.fault(Capability::Send, Mode::Fail), s_b, s_c]),
        local_link(registry(vec![p_a, p_b.fault(Capability::Receive, Mode::Panic), p_c])),
        EngineConfig::default(),
    );

    let report = engine.run(&batch_of(&["A", "B", "C"])).await.unwrap();

    assert!(!report.success);
    let order: Vec<(&str, bool)> = report
        .outcomes
        .iter()
        .map(|o| (o.extension_id.as_str(), o.result.success))
        .collect();
    assert_eq!(order, vec![("a", false), ("b", false), ("c", true)]);
    assert_eq!(report.faults.len(), 2);
    assert_eq!(report.faults[0].capability, Capability::Send);
    assert_eq!(report.faults[1].capability, Capability::Receive);
}

#[tokio::test]
async fn payload_for_extension_without_receive_is_a_failure() {
    let staging = TestExtension::new("Half").declare([Capability::Send]).sends(json!(1));
    let production = TestExtension::new("Half");
    let engine = TransferEngine::new(
        registry(vec![staging]),
        local_link(registry(vec![production])),
        EngineConfig::default(),
    );

    let report = engine.run(&batch_of(&["Half"])).await.unwrap();

    assert!(!report.success);
    assert!(report.faults[0].message.contains("not implemented"));
}

#[tokio::test]
async fn payload_for_unregistered_extension_is_a_failure() {
    let staging = TestExtension::new("Orphan").declare([Capability::Send]).sends(json!(1));
    let engine = TransferEngine::new(
        registry(vec![staging]),
        local_link(registry(vec![])),
        EngineConfig::default(),
    );

    let report = engine.run(&batch_of(&["Orphan"])).await.unwrap();

    assert!(!report.success);
    let outcome = report.outcome(&ExtensionId::from("orphan")).unwrap();
    assert!(outcome.result.message.contains("not registered"));
}
