//! Catalog of known libraries and their download locations.
//!
//! The catalog document is a JSON object keyed by library name:
//!
//! ```json
//! {
//!     "jquery": {
//!         "original": "https://code.jquery.com/jquery-{version}.js",
//!         "minified": "https://code.jquery.com/jquery-{version}.min.js",
//!         "license": "https://raw.github.com/jquery/jquery/master/MIT-LICENSE.txt",
//!         "version": "2.0.3"
//!     }
//! }
//! ```
//!
//! Empty strings count as absent.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::adapters::Fetcher;
use crate::config::ResolvedConfig;
use crate::domain::Variant;

/// Placeholder replaced by the version in URL templates
pub const VERSION_TOKEN: &str = "{version}";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog unavailable from {source_name}: {reason}")]
    Unavailable { source_name: String, reason: String },
}

/// Where the catalog is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Local override file
    Local(PathBuf),

    /// Canonical remote document
    Remote(String),
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{}", url),
        }
    }
}

impl CatalogSource {
    /// Pick the catalog source for a run.
    ///
    /// A local catalog file means the user wants to override the canonical
    /// catalog, so it is used whenever it exists.
    pub fn discover(config: &ResolvedConfig) -> Self {
        let local = config.catalog_path();
        if local.is_file() {
            Self::Local(local)
        } else {
            Self::Remote(config.catalog_url.clone())
        }
    }
}

/// Download templates for one library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Library name (catalog key)
    #[serde(skip)]
    pub name: String,

    /// Unminified build URL template
    #[serde(default, deserialize_with = "empty_as_none")]
    pub original: Option<String>,

    /// Minified build URL template
    #[serde(default, deserialize_with = "empty_as_none")]
    pub minified: Option<String>,

    /// License URL
    #[serde(default, deserialize_with = "empty_as_none")]
    pub license: Option<String>,

    /// Current version, substituted into templates
    #[serde(default)]
    pub version: String,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl CatalogEntry {
    /// Create an entry with no templates
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            original: None,
            minified: None,
            license: None,
            version: version.into(),
        }
    }

    pub fn with_original(mut self, template: impl Into<String>) -> Self {
        self.original = Some(template.into());
        self
    }

    pub fn with_minified(mut self, template: impl Into<String>) -> Self {
        self.minified = Some(template.into());
        self
    }

    pub fn with_license(mut self, url: impl Into<String>) -> Self {
        self.license = Some(url.into());
        self
    }

    /// URL template for a variant, if the entry has one
    pub fn template(&self, variant: Variant) -> Option<&str> {
        match variant {
            Variant::Original => self.original.as_deref(),
            Variant::Minified => self.minified.as_deref(),
            Variant::License => self.license.as_deref(),
        }
    }

    /// Whether at least one build is downloadable
    pub fn is_usable(&self) -> bool {
        self.original.is_some() || self.minified.is_some()
    }

    /// Copy of this entry with the version replaced by a manifest override
    pub fn with_version_override(&self, version: Option<&str>) -> Self {
        let mut entry = self.clone();
        if let Some(version) = version.filter(|v| !v.is_empty()) {
            entry.version = version.to_string();
        }
        entry
    }
}

/// All known libraries, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog document
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, CatalogEntry> = serde_json::from_str(content)?;

        let entries = raw
            .into_iter()
            .map(|(name, mut entry)| {
                entry.name = name.clone();
                if !entry.is_usable() {
                    warn!(library = %name, "Catalog entry has neither an original nor a minified URL");
                }
                (name, entry)
            })
            .collect();

        Ok(Self { entries })
    }

    /// Load the catalog from its source. Any failure is fatal for the run.
    pub async fn load(
        source: &CatalogSource,
        fetcher: &dyn Fetcher,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let unavailable = |reason: String| CatalogError::Unavailable {
            source_name: source.to_string(),
            reason,
        };

        let content = match source {
            CatalogSource::Local(path) => {
                info!(path = %path.display(), "Using local catalog override");
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| unavailable(e.to_string()))?
            }
            CatalogSource::Remote(url) => {
                info!(%url, "Downloading library catalog");
                fetcher
                    .fetch_text(url, timeout)
                    .await
                    .map_err(|e| unavailable(e.to_string()))?
            }
        };

        let catalog = Self::from_json(&content).map_err(|e| unavailable(e.to_string()))?;
        info!(libraries = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    /// Add or replace an entry
    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    /// Look up a library by name
    pub fn resolve(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}
