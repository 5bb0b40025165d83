//! Main orchestrator for download runs.
//!
//! A run has two phases. Provisioning walks every section folder (and the
//! license folder, if any) and asks before creating missing ones; the first
//! refusal aborts the run before any transfer. Downloading then attempts
//! every requested variant. Per-item problems are logged and recorded, never
//! propagated: the run completes once everything has been attempted.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{Confirmer, Fetcher};
use crate::domain::{
    Completion, ItemOutcome, ItemStatus, Manifest, ResolvedDownload, RunState, Variant,
};
use crate::library::Catalog;

use super::limits::TransferLimits;
use super::naming::{destination_path, folder_path, resolve_filename};
use super::provision::{FolderProvisioner, ProvisionError};

/// Fatal run errors
#[derive(Debug, Error)]
pub enum RunAborted {
    #[error("Run aborted: {0}")]
    Provision(#[from] ProvisionError),

    #[error("Run aborted: downloads did not finish within {0:?}")]
    TimedOut(Duration),
}

/// One planned unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedItem {
    /// A transfer to perform
    Transfer(ResolvedDownload),

    /// Settled without a transfer
    Skip(ItemOutcome),
}

/// Everything a run will attempt, in order
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    pub items: Vec<PlannedItem>,
}

impl RunPlan {
    pub fn transfers(&self) -> impl Iterator<Item = &ResolvedDownload> {
        self.items.iter().filter_map(|item| match item {
            PlannedItem::Transfer(download) => Some(download),
            PlannedItem::Skip(_) => None,
        })
    }

    pub fn skips(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter_map(|item| match item {
            PlannedItem::Skip(outcome) => Some(outcome),
            PlannedItem::Transfer(_) => None,
        })
    }
}

/// Download run orchestrator
pub struct Orchestrator {
    /// Transport for transfers
    fetcher: Arc<dyn Fetcher>,

    /// Folder creation with confirmation
    provisioner: FolderProvisioner,

    /// Limits snapshot for every run
    limits: TransferLimits,

    /// Project root that section folders are relative to
    root: PathBuf,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        confirmer: Arc<dyn Confirmer>,
        limits: TransferLimits,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            provisioner: FolderProvisioner::new(confirmer),
            limits: limits.normalized(),
            root: root.into(),
        }
    }

    /// Provision folders, then download every requested variant
    #[instrument(skip_all, fields(fetcher = self.fetcher.name(), sections = manifest.sections.len()))]
    pub async fn run(&self, manifest: &Manifest, catalog: &Catalog) -> Result<Completion, RunAborted> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = RunState::Pending;
        info!(%run_id, libraries = manifest.library_count(), "Starting run");

        advance(&mut state, RunState::Provisioning);
        for folder in self.folders(manifest) {
            if let Err(e) = self.provisioner.ensure(&folder).await {
                advance(&mut state, RunState::Aborted);
                error!(error = %e, "Folder provisioning failed");
                return Err(e.into());
            }
        }
        advance(&mut state, RunState::Provisioned);

        let plan = self.plan(manifest, catalog);

        advance(&mut state, RunState::Downloading);
        info!(transfers = plan.transfers().count(), "Starting to download packages");

        let run_timeout = self.limits.run_timeout();
        let outcomes = match tokio::time::timeout(run_timeout, self.execute(plan)).await {
            Ok(outcomes) => outcomes,
            Err(_) => {
                advance(&mut state, RunState::Aborted);
                error!(timeout = ?run_timeout, "Run timed out");
                return Err(RunAborted::TimedOut(run_timeout));
            }
        };

        advance(&mut state, RunState::Completed);
        let completion = Completion {
            run_id,
            state,
            started_at,
            completed_at: Utc::now(),
            outcomes,
        };

        info!(
            downloaded = completion.downloaded(),
            skipped = completion.skipped(),
            failed = completion.failed(),
            "Package completely processed"
        );

        Ok(completion)
    }

    /// Folders to provision, in section order, without duplicates
    pub fn folders(&self, manifest: &Manifest) -> Vec<PathBuf> {
        // Sections may enable licenses even when the global flag is off
        let licenses_wanted = manifest
            .sections
            .iter()
            .any(|section| section.policy(&manifest.policy).include_license);
        let license_folder = manifest
            .license_folder
            .as_deref()
            .filter(|_| licenses_wanted);

        let mut seen = HashSet::new();
        manifest
            .sections
            .iter()
            .map(|section| section.target.as_str())
            .chain(license_folder)
            .map(|folder| folder_path(&self.root, folder))
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }

    /// Resolve every requested variant into a transfer or a skip
    pub fn plan(&self, manifest: &Manifest, catalog: &Catalog) -> RunPlan {
        let mut items = Vec::new();
        let mut destinations = HashSet::new();

        for section in &manifest.sections {
            let policy = section.policy(&manifest.policy);

            for request in &section.libraries {
                let skip = |variant: Option<Variant>, reason: String| {
                    PlannedItem::Skip(ItemOutcome {
                        section: section.target.clone(),
                        library: request.name.clone(),
                        variant,
                        status: ItemStatus::Skipped { reason },
                    })
                };

                let Some(entry) = catalog.resolve(&request.name) else {
                    warn!(library = %request.name, "Library does not exist in catalog");
                    items.push(skip(None, "not in catalog".to_string()));
                    continue;
                };
                let entry = entry.with_version_override(request.version.as_deref());

                for variant in policy.enabled_variants() {
                    let name = match resolve_filename(&entry, variant, &policy) {
                        Ok(name) => name,
                        Err(e) => {
                            warn!(library = %request.name, %variant, error = %e, "Skipping variant");
                            items.push(skip(Some(variant), e.to_string()));
                            continue;
                        }
                    };

                    let folder = match (variant, manifest.license_folder.as_deref()) {
                        (Variant::License, Some(license_folder)) => license_folder,
                        _ => section.target.as_str(),
                    };
                    let destination = destination_path(&self.root, folder, &name.filename);

                    if !destinations.insert(destination.clone()) {
                        debug!(library = %request.name, %variant, path = %destination.display(), "Destination already planned");
                        items.push(skip(
                            Some(variant),
                            format!("{} is already downloaded by this run", destination.display()),
                        ));
                        continue;
                    }

                    if let Some(requested) = name.fallback_from {
                        info!(
                            library = %request.name,
                            %requested,
                            used = %name.served,
                            "Variant not in catalog, downloading fallback"
                        );
                    }

                    items.push(PlannedItem::Transfer(ResolvedDownload {
                        library: request.name.clone(),
                        section: section.target.clone(),
                        variant,
                        source_url: name.url,
                        destination,
                    }));
                }
            }
        }

        RunPlan { items }
    }

    /// Settle every planned item, keeping plan order
    async fn execute(&self, plan: RunPlan) -> Vec<ItemOutcome> {
        stream::iter(plan.items)
            .map(|item| self.settle(item))
            .buffered(self.limits.concurrency)
            .collect()
            .await
    }

    async fn settle(&self, item: PlannedItem) -> ItemOutcome {
        match item {
            PlannedItem::Skip(outcome) => outcome,
            PlannedItem::Transfer(download) => self.transfer(download).await,
        }
    }

    async fn transfer(&self, download: ResolvedDownload) -> ItemOutcome {
        info!(path = %download.destination.display(), "Downloading");

        let status = match self
            .fetcher
            .download(
                &download.source_url,
                &download.destination,
                self.limits.transfer_timeout(),
            )
            .await
        {
            Ok(bytes) => {
                debug!(library = %download.library, bytes, "Download finished");
                ItemStatus::Downloaded {
                    destination: download.destination,
                    bytes,
                }
            }
            Err(e) => {
                warn!(
                    library = %download.library,
                    variant = %download.variant,
                    error = %e,
                    "Download failed"
                );
                ItemStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        ItemOutcome {
            section: download.section,
            library: download.library,
            variant: Some(download.variant),
            status,
        }
    }
}

fn advance(state: &mut RunState, next: RunState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid run transition {state:?} -> {next:?}"
    );
    debug!(from = ?*state, to = ?next, "Run state");
    *state = next;
}
