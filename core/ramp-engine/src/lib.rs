//! Staging-to-production batch deployment engine.
//!
//! Extensions register with a [`Registry`] on both environments. On staging,
//! a [`BatchCoordinator`] drives one batch through three stages, each split
//! across the two environments:
//!
//! - **Comparison**: what differs between staging and production, and what
//!   the user may select.
//! - **Preflight**: whether the selected batch may be deployed. Any
//!   `__error__` in the report blocks it.
//! - **Transfer**: staging sends, production receives.
//!
//! Production answers through a [`ProductionResponder`], reached over a
//! [`ProductionLink`] ([`LocalLink`] in-process, [`HttpLink`] over HTTP).
//! Every extension callback runs fault-isolated: an error, panic, or
//! timeout is recorded as an attributed [`Fault`](ramp_types::Fault) and the
//! rest of the pass continues.

mod comparison;
mod config;
mod coordinator;
mod error;
mod invoke;
mod link;
mod preflight;
pub mod protocol;
mod registry;
mod responder;
mod transfer;

pub use comparison::ComparisonEngine;
pub use config::EngineConfig;
pub use coordinator::{BatchCoordinator, BatchReport, BatchStage, BatchStatus, HandshakeReport};
pub use error::{CallbackFault, DeployError, DeployResult, RegistrationError};
pub use link::{HttpLink, LocalLink, ProductionLink, DEPLOY_PATH};
pub use preflight::PreflightEngine;
pub use protocol::{DeployEnvelope, DeployRequest, DeployResponse, ExtensionReply, PROTOCOL_VERSION};
pub use registry::{ExtensionSummary, RegisteredExtension, Registry};
pub use responder::ProductionResponder;
pub use transfer::TransferEngine;
