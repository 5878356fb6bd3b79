//! HTTP API and wiring for a RAMP node.

pub mod config;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use ramp_engine::{
    DeployEnvelope, DeployResponse, ExtensionSummary, ProductionResponder, RegistrationError,
    Registry, DEPLOY_PATH, PROTOCOL_VERSION,
};
use ramp_extension::OptionStore;
use ramp_plugin_example::AdminEmailExtension;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const EXTENSIONS_PATH: &str = "/api/v1/extensions";
pub const HEALTH_PATH: &str = "/api/v1/health";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub environment: String,
    pub protocol_version: u32,
    pub extensions: usize,
}

/// Registers the extensions this node ships with.
pub fn build_registry(store: Arc<dyn OptionStore>) -> Result<Registry, RegistrationError> {
    let mut registry = Registry::new();
    registry.register(AdminEmailExtension::new(store))?;
    Ok(registry)
}

async fn deploy_handler(
    State(responder): State<Arc<ProductionResponder>>,
    Json(envelope): Json<DeployEnvelope>,
) -> Json<DeployResponse> {
    Json(responder.handle(envelope).await)
}

async fn extensions_handler(
    State(responder): State<Arc<ProductionResponder>>,
) -> Json<Vec<ExtensionSummary>> {
    Json(responder.registry().summaries())
}

async fn health_handler(State(responder): State<Arc<ProductionResponder>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        environment: responder.environment().to_string(),
        protocol_version: PROTOCOL_VERSION,
        extensions: responder.registry().len(),
    })
}

/// Build the HTTP API router around a production responder.
pub fn build_router(responder: Arc<ProductionResponder>) -> Router {
    Router::new()
        .route(DEPLOY_PATH, post(deploy_handler))
        .route(EXTENSIONS_PATH, get(extensions_handler))
        .route(HEALTH_PATH, get(health_handler))
        .with_state(responder)
}
