//! Target folder provisioning.
//!
//! Missing folders are only created after the user agrees. A refusal is
//! fatal for the run: there is nowhere to put the files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::adapters::Confirmer;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Destination folder {path} does not exist and was not created")]
    Declined { path: PathBuf },

    #[error("{path} exists but is not a folder")]
    NotADirectory { path: PathBuf },

    #[error("Failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not ask about {path}: {message}")]
    Prompt { path: PathBuf, message: String },
}

/// Ensures target folders exist, asking before creating any
pub struct FolderProvisioner {
    confirmer: Arc<dyn Confirmer>,
}

impl FolderProvisioner {
    pub fn new(confirmer: Arc<dyn Confirmer>) -> Self {
        Self { confirmer }
    }

    /// Make sure `path` is an existing folder.
    ///
    /// The question runs on the blocking pool so the runtime keeps polling
    /// other work (Ctrl-C) while the user answers.
    pub async fn ensure(&self, path: &Path) -> Result<(), ProvisionError> {
        if path.is_dir() {
            debug!(path = %path.display(), "Destination folder exists");
            return Ok(());
        }

        if path.exists() {
            return Err(ProvisionError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        let prompt = format!("The {} folder does not exist. Create it?", path.display());
        let confirmer = Arc::clone(&self.confirmer);
        let prompt_error = |message: String| ProvisionError::Prompt {
            path: path.to_path_buf(),
            message,
        };

        let confirmed = tokio::task::spawn_blocking(move || confirmer.confirm(&prompt))
            .await
            .map_err(|e| prompt_error(e.to_string()))?
            .map_err(|e| prompt_error(e.to_string()))?;

        if !confirmed {
            return Err(ProvisionError::Declined {
                path: path.to_path_buf(),
            });
        }

        std::fs::create_dir_all(path).map_err(|source| ProvisionError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Destination folder created");
        Ok(())
    }
}
