//! SDK for building RAMP deployment extensions.
//!
//! Extension authors implement [`DeployExtension`], declare the callback
//! slots they fill through [`CapabilitySet`], and read or write settings
//! through an injected [`OptionStore`].
//!
//! # Example
//!
//! ```
//! use ramp_extension::prelude::*;
//! use serde_json::{json, Value};
//!
//! struct Banner;
//!
//! impl DeployExtension for Banner {
//!     fn name(&self) -> &str {
//!         "Site Banner"
//!     }
//!
//!     fn capabilities(&self) -> CapabilitySet {
//!         CapabilitySet::empty()
//!             .with(Capability::Send)
//!             .with(Capability::Receive)
//!     }
//!
//!     fn send(&self, _batch: &Batch, _mode: SendMode) -> CallbackResult<Option<Value>> {
//!         Ok(Some(json!({"banner": "hello"})))
//!     }
//!
//!     fn receive(&self, _data: &Value) -> CallbackResult<TransferResult> {
//!         Ok(TransferResult::ok("banner updated"))
//!     }
//! }
//!
//! assert!(Banner.capabilities().contains(Capability::Receive));
//! ```

mod edits;
mod error;
mod extension;
pub mod prelude;
mod store;

pub use edits::ReportEdits;
pub use error::{CallbackError, CallbackResult, OptionStoreError};
pub use extension::{DeployExtension, SendMode};
pub use store::{MemoryOptionStore, OptionStore};

pub use ramp_types;
