//! Staging → production links.
//!
//! A link carries one [`DeployEnvelope`] to production and returns its
//! answer. The engines add the caller's deadline on top; links never retry.

use crate::error::{DeployError, DeployResult};
use crate::protocol::{DeployEnvelope, DeployResponse};
use crate::responder::ProductionResponder;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Path of the deploy endpoint on a production node.
pub const DEPLOY_PATH: &str = "/api/v1/deploy";

/// A blocking request/response channel to production.
#[async_trait]
pub trait ProductionLink: Send + Sync {
    /// Sends one request and waits for the answer.
    async fn call(&self, envelope: DeployEnvelope) -> DeployResult<DeployResponse>;
}

/// Calls `link` under `timeout` and turns a rejected request into an error.
pub(crate) async fn call_production(
    link: &dyn ProductionLink,
    envelope: DeployEnvelope,
    timeout: Duration,
) -> DeployResult<DeployResponse> {
    let kind = envelope.request.kind();
    debug!(request = kind, "Calling production");
    let response = tokio::time::timeout(timeout, link.call(envelope))
        .await
        .map_err(|_| DeployError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        })??;

    match response {
        DeployResponse::Error { message } => Err(DeployError::Remote(message)),
        other => Ok(other),
    }
}

/// In-process link to a responder, for single-process deployments and tests.
pub struct LocalLink {
    responder: Arc<ProductionResponder>,
}

impl LocalLink {
    pub fn new(responder: Arc<ProductionResponder>) -> Self {
        Self { responder }
    }
}

#[async_trait]
impl ProductionLink for LocalLink {
    async fn call(&self, envelope: DeployEnvelope) -> DeployResult<DeployResponse> {
        Ok(self.responder.handle(envelope).await)
    }
}

/// JSON-over-HTTP link to a production node.
pub struct HttpLink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLink {
    /// Creates a link to the node at `base_url` (e.g. `http://prod:4100`).
    pub fn new(base_url: &str, timeout: Duration) -> DeployResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ramp-engine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeployError::Transport(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), DEPLOY_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ProductionLink for HttpLink {
    async fn call(&self, envelope: DeployEnvelope) -> DeployResult<DeployResponse> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| DeployError::Transport(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(DeployError::Transport(format!(
                "HTTP {} from {}",
                resp.status(),
                self.endpoint
            )));
        }

        resp.json::<DeployResponse>()
            .await
            .map_err(|e| DeployError::Protocol(format!("invalid response body: {e}")))
    }
}
