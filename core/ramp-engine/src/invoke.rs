//! Fault-isolated callback invocation.
//!
//! Every callback runs on tokio's blocking pool under a deadline. Errors,
//! panics, and overruns come back as a [`Fault`] attributed to the
//! extension; nothing propagates to the rest of the pass.

use crate::error::CallbackFault;
use crate::registry::RegisteredExtension;
use ramp_extension::{CallbackResult, DeployExtension};
use ramp_types::{Capability, ExtensionId, Fault};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::time::Duration;
use tracing::warn;

/// Runs one callback of `extension`.
pub(crate) async fn invoke<T, F>(
    extension: &RegisteredExtension,
    capability: Capability,
    timeout: Duration,
    call: F,
) -> Result<T, Fault>
where
    T: Send + 'static,
    F: FnOnce(&dyn DeployExtension) -> CallbackResult<T> + Send + 'static,
{
    if !extension.supports(capability) {
        return Err(fault(
            extension.id(),
            capability,
            CallbackFault::Unsupported(capability),
        ));
    }

    let handle = extension.handle();
    let task = tokio::task::spawn_blocking(move || call(&*handle));

    let failure = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(value))) => return Ok(value),
        Ok(Ok(Err(err))) => CallbackFault::from(err),
        Ok(Err(join_err)) if join_err.is_panic() => {
            CallbackFault::Panicked(panic_message(join_err.into_panic()))
        }
        Ok(Err(join_err)) => CallbackFault::Failed(join_err.to_string()),
        Err(_) => CallbackFault::TimedOut {
            timeout_ms: timeout.as_millis() as u64,
        },
    };

    Err(fault(extension.id(), capability, failure))
}

/// Decodes a value returned across the wire into the callback's result type.
pub(crate) fn decode<T: DeserializeOwned>(
    extension_id: &ExtensionId,
    capability: Capability,
    value: Value,
) -> Result<T, Fault> {
    serde_json::from_value(value).map_err(|e| {
        fault(
            extension_id,
            capability,
            CallbackFault::Malformed(e.to_string()),
        )
    })
}

/// Builds and logs an attributed fault.
pub(crate) fn fault(
    extension_id: &ExtensionId,
    capability: Capability,
    failure: CallbackFault,
) -> Fault {
    warn!(extension_id = %extension_id, %capability, "Callback fault: {}", failure);
    Fault::new(extension_id.clone(), capability, failure.to_string())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
