//! HTTP fetcher backed by reqwest.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::timeout;
use tracing::debug;

use super::{Fetcher, TransferError};

/// User agent sent with every request
const USER_AGENT: &str = concat!("upm/", env!("CARGO_PKG_VERSION"));

/// Fetcher using a shared reqwest client
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the upm user agent
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, TransferError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

fn request_error(url: &str, error: reqwest::Error) -> TransferError {
    TransferError::Request {
        url: url.to_string(),
        message: error.to_string(),
    }
}

/// Streams a response body into an open file, returning bytes written
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, TransferError> {
    let io_error = |source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| request_error(url, e))?;
        writer.write_all(&chunk).await.map_err(io_error)?;
        bytes_written += chunk.len() as u64;
    }

    writer.flush().await.map_err(io_error)?;

    Ok(bytes_written)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_text(&self, url: &str, limit: Duration) -> Result<String, TransferError> {
        let request = async {
            let response = self.get(url).await?;
            response.text().await.map_err(|e| request_error(url, e))
        };

        timeout(limit, request)
            .await
            .map_err(|_| TransferError::TimedOut {
                url: url.to_string(),
                after: limit,
            })?
    }

    async fn download(
        &self,
        url: &str,
        destination: &Path,
        limit: Duration,
    ) -> Result<u64, TransferError> {
        // Open first so the file is ready before any byte arrives
        let mut file = File::create(destination)
            .await
            .map_err(|source| TransferError::Io {
                path: destination.to_path_buf(),
                source,
            })?;

        let transfer = async {
            let response = self.get(url).await?;
            stream_to_file(&mut file, response, url, destination).await
        };

        let result = match timeout(limit, transfer).await {
            Ok(result) => result,
            Err(_) => Err(TransferError::TimedOut {
                url: url.to_string(),
                after: limit,
            }),
        };

        drop(file);

        // Nothing was written for a rejected request
        if let Err(TransferError::Status { .. }) = &result {
            if let Err(e) = tokio::fs::remove_file(destination).await {
                debug!(path = %destination.display(), error = %e, "Could not remove empty file");
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent() {
        assert!(USER_AGENT.starts_with("upm/"));
    }

    #[tokio::test]
    async fn test_fetcher_name() {
        let fetcher = HttpFetcher::new().unwrap();
        assert_eq!(fetcher.name(), "http");
    }
}
