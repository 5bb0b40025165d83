//! Configuration for upm runs.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (UPM_CATALOG_URL)
//! 2. Project config file (.upm/config.yaml in the current directory or a parent)
//! 3. User config file (~/.upm/config.yaml)
//! 4. Defaults
//!
//! The project root is the directory that holds `.upm/`, or the starting
//! directory when no project config exists. Manifest, descriptor and catalog
//! file names are resolved against that root.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::TransferLimits;

/// Canonical catalog location
pub const DEFAULT_CATALOG_URL: &str = "https://raw.github.com/sondreb/upm/master/libraries.json";

/// Environment variable that replaces the catalog URL
pub const CATALOG_URL_ENV: &str = "UPM_CATALOG_URL";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub catalog_url: Option<String>,
    #[serde(default)]
    pub limits: Option<LimitsConfig>,
    #[serde(default)]
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesConfig {
    /// Standalone manifest file name
    pub manifest: Option<String>,
    /// Host project descriptor file name
    pub descriptor: Option<String>,
    /// Local catalog override file name
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub transfer_timeout_seconds: Option<u64>,
    pub run_timeout_seconds: Option<u64>,
    pub concurrency: Option<usize>,
}

/// File names looked up in the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFiles {
    pub manifest: String,
    pub descriptor: String,
    pub catalog: String,
}

impl Default for ProjectFiles {
    fn default() -> Self {
        Self {
            manifest: "upm.json".to_string(),
            descriptor: "package.json".to_string(),
            catalog: "libraries.json".to_string(),
        }
    }
}

/// Resolved configuration for one run
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute project root
    pub root: PathBuf,
    /// File names inside the root
    pub files: ProjectFiles,
    /// Remote catalog URL
    pub catalog_url: String,
    /// Timeouts and concurrency
    pub limits: TransferLimits,
    /// Exit non-zero when any item failed
    pub strict: bool,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Defaults rooted at `root`, ignoring config files and environment
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: ProjectFiles::default(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            limits: TransferLimits::default(),
            strict: false,
            config_file: None,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.files.manifest)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(&self.files.catalog)
    }
}

/// Path of a config file under `dir`
fn config_path_in(dir: &Path) -> PathBuf {
    dir.join(".upm").join("config.yaml")
}

/// Find a project config file by searching `start` and its parents.
///
/// The home directory is never a project root: its `.upm/` holds the user
/// config, so the search stops below it.
fn find_project_config(start: &Path, home: Option<&Path>) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if home == Some(current.as_path()) {
            break;
        }

        let config_path = config_path_in(&current);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// The per-user config file, if one exists
fn find_user_config(home: Option<&Path>) -> Option<PathBuf> {
    let path = config_path_in(home?);
    path.exists().then_some(path)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse_config(content: &str) -> Result<ConfigFile> {
    // An empty YAML document deserializes as null
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Merge a parsed config file over the defaults
fn resolve(root: PathBuf, config: ConfigFile, config_file: Option<PathBuf>) -> ResolvedConfig {
    let defaults = ProjectFiles::default();
    let files = ProjectFiles {
        manifest: config.files.manifest.unwrap_or(defaults.manifest),
        descriptor: config.files.descriptor.unwrap_or(defaults.descriptor),
        catalog: config.files.catalog.unwrap_or(defaults.catalog),
    };

    let default_limits = TransferLimits::default();
    let limits = match config.limits {
        Some(l) => TransferLimits {
            transfer_timeout_seconds: l
                .transfer_timeout_seconds
                .unwrap_or(default_limits.transfer_timeout_seconds),
            run_timeout_seconds: l
                .run_timeout_seconds
                .unwrap_or(default_limits.run_timeout_seconds),
            concurrency: l.concurrency.unwrap_or(default_limits.concurrency),
        },
        None => default_limits,
    };

    let catalog_url = std::env::var(CATALOG_URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .or(config.catalog_url)
        .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());

    ResolvedConfig {
        root,
        files,
        catalog_url,
        limits: limits.normalized(),
        strict: config.strict.unwrap_or(false),
        config_file,
    }
}

/// Load configuration for a run started in `start_dir`
pub fn load_config(start_dir: &Path) -> Result<ResolvedConfig> {
    load_config_with_home(start_dir, dirs::home_dir().as_deref())
}

/// Load configuration with an explicit home directory
pub fn load_config_with_home(start_dir: &Path, home: Option<&Path>) -> Result<ResolvedConfig> {
    let start_dir = std::path::absolute(start_dir)
        .with_context(|| format!("Failed to resolve {}", start_dir.display()))?;
    let home = home.map(|h| std::path::absolute(h).unwrap_or_else(|_| h.to_path_buf()));
    let home = home.as_deref();

    if let Some(config_path) = find_project_config(&start_dir, home) {
        let config = load_config_file(&config_path)?;

        // Root is the parent of .upm/ (i.e., grandparent of config.yaml)
        let root = config_path
            .parent()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| start_dir.clone());

        return Ok(resolve(root, config, Some(config_path)));
    }

    if let Some(user_path) = find_user_config(home) {
        let config = load_config_file(&user_path)?;
        return Ok(resolve(start_dir, config, Some(user_path)));
    }

    Ok(resolve(start_dir, ConfigFile::default(), None))
}
