//! Adapter interfaces for external systems.
//!
//! Adapters keep network and terminal access out of the core:
//! - `Fetcher`: HTTP transport for the catalog and for asset transfers
//! - `Confirmer`: yes/no decisions asked of the user

pub mod http;
pub mod prompt;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpFetcher;
pub use prompt::{FixedAnswer, TerminalPrompt};

/// Failure of a single transfer
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Transfer from {url} timed out after {after:?}")]
    TimedOut { url: String, after: Duration },
}

/// Trait for the raw transport
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Human-readable fetcher name
    fn name(&self) -> &str;

    /// GET a document and return its body as text
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, TransferError>;

    /// Stream a URL into `destination`, returning the bytes written.
    ///
    /// The destination is opened before the request is sent and closed only
    /// after the body has been fully written.
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        timeout: Duration,
    ) -> Result<u64, TransferError>;
}

/// Trait for yes/no questions put to the user
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}
