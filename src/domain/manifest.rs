//! Package manifest parsing.
//!
//! A manifest is a JSON object. Top-level keys are either policy flags
//! (`original`, `minified`, `license`/`licenses`, `version`/`filenames`) or
//! sections: any key containing `./` names a target folder and maps library
//! names to an optional version override.
//!
//! ```json
//! {
//!     "original": true,
//!     "minified": true,
//!     "version": false,
//!     "license": false,
//!     "./app/js/": { "jquery": "", "angular": "1.2.0" }
//! }
//! ```
//!
//! The same object may instead live under a `libraries` key of the host
//! project descriptor (`package.json`), which takes precedence over the
//! standalone `upm.json`.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ProjectFiles;

use super::policy::{parse_version_naming, DownloadPolicy, PolicyKey, PolicyOverrides};

/// Key inside the project descriptor that holds an embedded manifest
pub const EMBEDDED_KEY: &str = "libraries";

/// Marker that distinguishes section keys from policy flags
const SECTION_MARKER: &str = "./";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest: {0}")]
    Invalid(String),

    #[error("Failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ManifestError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// A parsed package description
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Global policy for every section
    pub policy: DownloadPolicy,

    /// Folder for license files, when `license` names a path
    pub license_folder: Option<String>,

    /// Sections in document order
    pub sections: Vec<Section>,
}

/// One target folder and the libraries to place in it
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Folder as written in the manifest (relative to the project root)
    pub target: String,

    /// Flags that replace the global policy for this section
    pub overrides: PolicyOverrides,

    /// Requested libraries in document order
    pub libraries: Vec<LibraryRequest>,
}

/// A library requested by a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRequest {
    pub name: String,

    /// Version to use instead of the catalog's current one
    pub version: Option<String>,
}

impl Section {
    /// Policy in effect for this section
    pub fn policy(&self, global: &DownloadPolicy) -> DownloadPolicy {
        global.with_overrides(&self.overrides)
    }
}

impl Manifest {
    /// Parse a manifest from JSON text
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| ManifestError::invalid(format!("not valid JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Build a manifest from an already parsed JSON value
    pub fn from_value(value: &Value) -> Result<Self, ManifestError> {
        let object = value
            .as_object()
            .ok_or_else(|| ManifestError::invalid("top level must be an object"))?;

        let mut policy = DownloadPolicy::default();
        let mut license_folder = None;
        let mut sections = Vec::new();

        for (key, value) in object {
            if key.contains(SECTION_MARKER) {
                sections.push(parse_section(key, value)?);
                continue;
            }

            match PolicyKey::from_key(key) {
                Some(PolicyKey::Original) => policy.include_original = expect_bool(key, value)?,
                Some(PolicyKey::Minified) => policy.include_minified = expect_bool(key, value)?,
                Some(PolicyKey::License) => match value {
                    Value::Bool(b) => policy.include_license = *b,
                    Value::String(path) if !path.trim().is_empty() => {
                        policy.include_license = true;
                        license_folder = Some(path.clone());
                    }
                    _ => {
                        return Err(ManifestError::invalid(format!(
                            "'{key}' must be a boolean or a folder path"
                        )))
                    }
                },
                Some(PolicyKey::Version) => {
                    policy.version_in_filename = match value {
                        Value::Bool(b) => *b,
                        Value::String(s) => parse_version_naming(s).ok_or_else(|| {
                            ManifestError::invalid(format!(
                                "'{key}' must be true, false, \"versioned\" or \"stripped\", got \"{s}\""
                            ))
                        })?,
                        _ => {
                            return Err(ManifestError::invalid(format!(
                                "'{key}' must be a boolean or a string"
                            )))
                        }
                    }
                }
                None => warn!(key = %key, "Ignoring unknown manifest key"),
            }
        }

        Ok(Self {
            policy,
            license_folder,
            sections,
        })
    }

    /// Number of library requests across all sections
    pub fn library_count(&self) -> usize {
        self.sections.iter().map(|s| s.libraries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

fn expect_bool(key: &str, value: &Value) -> Result<bool, ManifestError> {
    value
        .as_bool()
        .ok_or_else(|| ManifestError::invalid(format!("'{key}' must be a boolean")))
}

fn parse_section(key: &str, value: &Value) -> Result<Section, ManifestError> {
    let items: &Map<String, Value> = value.as_object().ok_or_else(|| {
        ManifestError::invalid(format!("section '{key}' must map library names to versions"))
    })?;

    let mut overrides = PolicyOverrides::default();
    let mut libraries = Vec::with_capacity(items.len());

    for (name, version) in items {
        match version {
            Value::String(v) => libraries.push(LibraryRequest {
                name: name.clone(),
                version: Some(v.trim().to_string()).filter(|v| !v.is_empty()),
            }),
            Value::Null => libraries.push(LibraryRequest {
                name: name.clone(),
                version: None,
            }),
            Value::Bool(flag) => {
                let policy_key = PolicyKey::from_key(name).ok_or_else(|| {
                    ManifestError::invalid(format!(
                        "section '{key}': '{name}' must be a version string"
                    ))
                })?;
                policy_key.set(&mut overrides, *flag);
            }
            _ => {
                return Err(ManifestError::invalid(format!(
                    "section '{key}': '{name}' must be a version string"
                )))
            }
        }
    }

    Ok(Section {
        target: key.to_string(),
        overrides,
        libraries,
    })
}

/// Where a manifest was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// `libraries` key of the host project descriptor
    Embedded(PathBuf),

    /// Standalone manifest file
    Standalone(PathBuf),
}

impl ManifestSource {
    /// Locate the manifest for a project root.
    ///
    /// The descriptor wins when it carries a `libraries` key; otherwise the
    /// standalone file is used. `None` means neither exists.
    pub fn discover(root: &Path, files: &ProjectFiles) -> Option<Self> {
        let descriptor = root.join(&files.descriptor);
        if descriptor_has_manifest(&descriptor) {
            return Some(Self::Embedded(descriptor));
        }

        let standalone = root.join(&files.manifest);
        if standalone.is_file() {
            return Some(Self::Standalone(standalone));
        }

        None
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Embedded(path) | Self::Standalone(path) => path,
        }
    }

    /// Read and parse the manifest from this source
    pub fn load(&self) -> Result<Manifest, ManifestError> {
        let path = self.path();
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match self {
            Self::Standalone(_) => Manifest::parse(&content),
            Self::Embedded(_) => {
                let value: Value = serde_json::from_str(&content).map_err(|e| {
                    ManifestError::invalid(format!("{}: not valid JSON: {e}", path.display()))
                })?;
                let embedded = value.get(EMBEDDED_KEY).ok_or_else(|| {
                    ManifestError::invalid(format!(
                        "{} has no '{EMBEDDED_KEY}' key",
                        path.display()
                    ))
                })?;
                Manifest::from_value(embedded)
            }
        }
    }
}

fn descriptor_has_manifest(path: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(path) else {
        return false;
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(value) => value.get(EMBEDDED_KEY).is_some(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Project descriptor is not valid JSON");
            false
        }
    }
}

/// Starter manifests written when a project has none
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestTemplate {
    Sample,
    Empty,
}

impl ManifestTemplate {
    pub fn document(self) -> Value {
        match self {
            Self::Empty => serde_json::json!({
                "./app/js/": {
                    "jquery": ""
                }
            }),
            Self::Sample => serde_json::json!({
                "original": true,
                "minified": true,
                "version": false,
                "license": false,
                "./app/js/": {
                    "jquery": "",
                    "jquery-signalr": "",
                    "angular": "",
                    "angular-animate": ""
                },
                "./service/js/": {
                    "jquery": ""
                }
            }),
        }
    }

    /// Write the template to `path`, replacing any existing file
    pub fn write(self, path: &Path) -> Result<(), ManifestError> {
        let mut content = serde_json::to_string_pretty(&self.document())
            .map_err(|e| ManifestError::invalid(e.to_string()))?;
        content.push('\n');

        std::fs::write(path, content).map_err(|source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags_and_sections() {
        let manifest = Manifest::parse(
            r#"{
                "original": true,
                "minified": false,
                "version": true,
                "license": false,
                "./app/js/": { "jquery": "", "angular": "1.2.0" },
                "./service/js/": { "jquery": "" }
            }"#,
        )
        .unwrap();

        assert!(manifest.policy.include_original);
        assert!(!manifest.policy.include_minified);
        assert!(manifest.policy.version_in_filename);
        assert_eq!(manifest.sections.len(), 2);
        assert_eq!(manifest.sections[0].target, "./app/js/");
        assert_eq!(
            manifest.sections[0].libraries[1],
            LibraryRequest {
                name: "angular".to_string(),
                version: Some("1.2.0".to_string()),
            }
        );
        assert_eq!(manifest.sections[0].libraries[0].version, None);
        assert_eq!(manifest.library_count(), 3);
    }

    #[test]
    fn test_section_order_follows_document() {
        let manifest = Manifest::parse(
            r#"{ "./z/": { "b": "", "a": "" }, "./a/": { "c": "" } }"#,
        )
        .unwrap();

        let targets: Vec<_> = manifest.sections.iter().map(|s| s.target.as_str()).collect();
        assert_eq!(targets, vec!["./z/", "./a/"]);

        let names: Vec<_> = manifest.sections[0]
            .libraries
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_missing_flags_use_defaults() {
        let manifest = Manifest::parse(r#"{ "./js/": { "jquery": "" } }"#).unwrap();
        assert_eq!(manifest.policy, DownloadPolicy::default());
    }

    #[test]
    fn test_license_path_enables_license_folder() {
        let manifest = Manifest::parse(r#"{ "licenses": "./licenses/" }"#).unwrap();
        assert!(manifest.policy.include_license);
        assert_eq!(manifest.license_folder.as_deref(), Some("./licenses/"));
    }

    #[test]
    fn test_filenames_string_forms() {
        let manifest = Manifest::parse(r#"{ "filenames": "stripped" }"#).unwrap();
        assert!(!manifest.policy.version_in_filename);

        let manifest = Manifest::parse(r#"{ "filenames": "versioned" }"#).unwrap();
        assert!(manifest.policy.version_in_filename);

        let err = Manifest::parse(r#"{ "filenames": "sideways" }"#).unwrap_err();
        assert!(matches!(err, ManifestError::Invalid(_)));
    }

    #[test]
    fn test_section_policy_override() {
        let manifest = Manifest::parse(
            r#"{ "minified": true, "./vendor/": { "minified": false, "jquery": "" } }"#,
        )
        .unwrap();

        let section = &manifest.sections[0];
        assert_eq!(section.libraries.len(), 1);
        assert_eq!(section.overrides.minified, Some(false));
        assert!(!section.policy(&manifest.policy).include_minified);
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        assert!(Manifest::parse("[]").is_err());
        assert!(Manifest::parse("{ not json").is_err());
        assert!(Manifest::parse(r#"{ "./js/": ["jquery"] }"#).is_err());
        assert!(Manifest::parse(r#"{ "./js/": { "jquery": 3 } }"#).is_err());
        assert!(Manifest::parse(r#"{ "./js/": { "jquery": true } }"#).is_err());
        assert!(Manifest::parse(r#"{ "original": "yes" }"#).is_err());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let manifest = Manifest::parse(r#"{ "name": "demo", "app/js/": {} }"#).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_templates_parse_back() {
        let sample = Manifest::from_value(&ManifestTemplate::Sample.document()).unwrap();
        assert_eq!(sample.sections.len(), 2);
        assert_eq!(sample.sections[0].libraries.len(), 4);

        let empty = Manifest::from_value(&ManifestTemplate::Empty.document()).unwrap();
        assert_eq!(empty.sections.len(), 1);
        assert_eq!(empty.sections[0].target, "./app/js/");
    }
}
