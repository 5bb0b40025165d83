//! Core resolution and retrieval logic.
//!
//! This module contains:
//! - Naming: URL and filename derivation
//! - Provision: Folder creation with confirmation
//! - Limits: Timeouts and concurrency
//! - Orchestrator: The two-phase run

pub mod limits;
pub mod naming;
pub mod orchestrator;
pub mod provision;

// Re-export commonly used types
pub use limits::TransferLimits;
pub use naming::{resolve_filename, NamingError, ResolvedName};
pub use orchestrator::{Orchestrator, PlannedItem, RunAborted, RunPlan};
pub use provision::{FolderProvisioner, ProvisionError};
