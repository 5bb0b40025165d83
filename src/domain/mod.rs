//! Domain types for upm.
//!
//! This module contains the core data structures:
//! - Manifest: Sections and policy flags read from the package description
//! - Policy: Inclusion and naming flags
//! - Download: Variants and resolved transfers
//! - Run: Run state and per-item outcomes

pub mod download;
pub mod manifest;
pub mod policy;
pub mod run;

// Re-export commonly used types
pub use download::{ResolvedDownload, Variant};
pub use manifest::{
    LibraryRequest, Manifest, ManifestError, ManifestSource, ManifestTemplate, Section,
};
pub use policy::{DownloadPolicy, PolicyOverrides};
pub use run::{Completion, ItemOutcome, ItemStatus, RunState};
