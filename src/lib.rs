//! upm - Micro Package Manager
//!
//! Fetches front-end library files described by a package manifest.
//!
//! # Architecture
//!
//! A run is a two-phase pipeline:
//! - The manifest names target folders and the libraries to put in them
//! - The catalog maps each library to URL templates and a current version
//! - Every target folder is provisioned first (asking before creating one)
//! - Every requested variant is then resolved to a URL and filename and
//!   downloaded; failures are recorded per item and never stop the run
//!
//! # Modules
//!
//! - `adapters`: HTTP transport and terminal prompts
//! - `config`: Run configuration
//! - `core`: Naming, provisioning and orchestration
//! - `domain`: Data structures (Manifest, DownloadPolicy, Completion)
//! - `library`: The library catalog
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Download everything listed in upm.json
//! upm
//!
//! # Same, with verbose logging
//! upm -verbose
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod library;

// Re-export main types at crate root for convenience
pub use adapters::{Confirmer, Fetcher, HttpFetcher, TransferError};
pub use config::{load_config, ResolvedConfig};
pub use core::{Orchestrator, RunAborted, TransferLimits};
pub use domain::{Completion, DownloadPolicy, ItemStatus, Manifest, ManifestSource, Variant};
pub use library::{Catalog, CatalogEntry, CatalogSource};
