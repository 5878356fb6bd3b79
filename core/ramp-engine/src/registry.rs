//! Extension registry.
//!
//! Populated once at startup, then shared read-only (`Arc<Registry>`) by
//! every engine pass. Iteration order is registration order, which is also
//! the order callbacks run in.

use crate::error::RegistrationError;
use ramp_extension::DeployExtension;
use ramp_types::{make_id, Capability, CapabilitySet, ExtensionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A registered extension with its derived id and declared slots.
pub struct RegisteredExtension {
    id: ExtensionId,
    name: String,
    description: String,
    capabilities: CapabilitySet,
    extension: Arc<dyn DeployExtension>,
}

impl RegisteredExtension {
    pub fn id(&self) -> &ExtensionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    pub(crate) fn handle(&self) -> Arc<dyn DeployExtension> {
        Arc::clone(&self.extension)
    }

    pub fn summary(&self) -> ExtensionSummary {
        ExtensionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            capabilities: self.capabilities,
        }
    }
}

impl std::fmt::Debug for RegisteredExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredExtension")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Serializable description of a registered extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionSummary {
    pub id: ExtensionId,
    pub name: String,
    pub description: String,
    pub capabilities: CapabilitySet,
}

/// The set of registered extensions.
#[derive(Debug, Default)]
pub struct Registry {
    extensions: Vec<RegisteredExtension>,
    index: HashMap<ExtensionId, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an extension under the id derived from its name.
    ///
    /// A second extension whose name normalizes to an existing id is
    /// rejected; the first registration is left untouched.
    pub fn register<E: DeployExtension>(
        &mut self,
        extension: E,
    ) -> Result<ExtensionId, RegistrationError> {
        self.register_arc(Arc::new(extension))
    }

    /// Registers an already shared extension.
    pub fn register_arc(
        &mut self,
        extension: Arc<dyn DeployExtension>,
    ) -> Result<ExtensionId, RegistrationError> {
        let name = extension.name().to_string();
        let id = make_id(&name);
        if id.is_empty() {
            return Err(RegistrationError::InvalidName(name));
        }
        if let Some(&existing) = self.index.get(&id) {
            return Err(RegistrationError::DuplicateId {
                id,
                existing: self.extensions[existing].name.clone(),
            });
        }

        let capabilities = extension.capabilities();
        info!(extension_id = %id, ?capabilities, "Extension registered");

        self.index.insert(id.clone(), self.extensions.len());
        self.extensions.push(RegisteredExtension {
            id: id.clone(),
            description: extension.description().to_string(),
            name,
            capabilities,
            extension,
        });
        Ok(id)
    }

    pub fn lookup(&self, id: &ExtensionId) -> Result<&RegisteredExtension, RegistrationError> {
        self.index
            .get(id)
            .map(|&i| &self.extensions[i])
            .ok_or_else(|| RegistrationError::NotFound(id.clone()))
    }

    pub fn contains(&self, id: &ExtensionId) -> bool {
        self.index.contains_key(id)
    }

    /// Extensions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredExtension> {
        self.extensions.iter()
    }

    /// Extensions declaring `capability`, in registration order.
    pub fn with_capability(
        &self,
        capability: Capability,
    ) -> impl Iterator<Item = &RegisteredExtension> {
        self.extensions
            .iter()
            .filter(move |e| e.supports(capability))
    }

    pub fn ids(&self) -> Vec<ExtensionId> {
        self.extensions.iter().map(|e| e.id.clone()).collect()
    }

    pub fn summaries(&self) -> Vec<ExtensionSummary> {
        self.extensions.iter().map(RegisteredExtension::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}
