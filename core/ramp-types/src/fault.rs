//! Attributed record of a failed extension callback.

use crate::capability::{Capability, Stage};
use crate::ids::ExtensionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A callback fault, downgraded to a diagnostic for one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub extension_id: ExtensionId,
    pub capability: Capability,
    pub message: String,
}

impl Fault {
    pub fn new(
        extension_id: ExtensionId,
        capability: Capability,
        message: impl Into<String>,
    ) -> Self {
        Self {
            extension_id,
            capability,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.capability.stage()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed in {}: {}",
            self.extension_id, self.capability, self.message
        )
    }
}
