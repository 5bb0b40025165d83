//! Download URL and filename derivation.
//!
//! Given a catalog entry, a variant and the naming policy, produces the URL
//! to fetch and the filename to write. Everything here is a pure function of
//! its inputs, so the same entry and policy always name the same file.
//!
//! Naming rules:
//! - License files are always `<library>.license`.
//! - Other variants take the last path segment of the version-substituted URL.
//! - A missing build falls back to the other build of the same library.
//! - With versions enabled, `name.min.js` becomes `name-<v>.min.js` and
//!   `name.js` becomes `name-<v>.js`, unless the version is already present.
//! - With versions disabled, `-<v>` and bare `<v>` are removed.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use url::Url;

use crate::domain::{DownloadPolicy, Variant};
use crate::library::{CatalogEntry, VERSION_TOKEN};

/// Minification marker inside a filename stem
const MIN_MARKER: &str = "min";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    #[error("'{library}' has no {variant} download")]
    NoSuchVariant { library: String, variant: Variant },

    #[error("Cannot derive a filename from {url}")]
    NoFilename { url: String },
}

/// URL and filename for one variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// URL to fetch (version substituted)
    pub url: String,

    /// Filename to write
    pub filename: String,

    /// Variant whose template was used
    pub served: Variant,

    /// The requested variant, when a fallback was used instead
    pub fallback_from: Option<Variant>,
}

/// Resolve the URL and filename for a variant of a catalog entry
pub fn resolve_filename(
    entry: &CatalogEntry,
    variant: Variant,
    policy: &DownloadPolicy,
) -> Result<ResolvedName, NamingError> {
    let no_such_variant = || NamingError::NoSuchVariant {
        library: entry.name.clone(),
        variant,
    };

    if variant == Variant::License {
        let url = entry.license.as_deref().ok_or_else(no_such_variant)?;
        return Ok(ResolvedName {
            url: substitute_version(url, &entry.version),
            filename: license_filename(&entry.name),
            served: Variant::License,
            fallback_from: None,
        });
    }

    let (served, template) = match entry.template(variant) {
        Some(template) => (variant, template),
        None => {
            let other = variant.counterpart().ok_or_else(no_such_variant)?;
            let template = entry.template(other).ok_or_else(no_such_variant)?;
            (other, template)
        }
    };

    let url = substitute_version(template, &entry.version);
    let basename = url_basename(&url).ok_or_else(|| NamingError::NoFilename { url: url.clone() })?;
    let filename = apply_version_policy(&basename, &entry.version, policy.version_in_filename);

    Ok(ResolvedName {
        url,
        filename,
        served,
        fallback_from: (served != variant).then_some(variant),
    })
}

/// Filename for a library's license
pub fn license_filename(library: &str) -> String {
    format!("{library}.license")
}

/// Replace every version placeholder in a template
pub fn substitute_version(template: &str, version: &str) -> String {
    template.replace(VERSION_TOKEN, version)
}

/// Last path segment of a URL, ignoring query and fragment
pub fn url_basename(url: &str) -> Option<String> {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => {
            let path = url.split(['?', '#']).next().unwrap_or(url);
            path.rsplit('/').next().map(str::to_string)
        }
    };

    segment.filter(|s| !s.is_empty())
}

/// Apply the version-in-filename policy
pub fn apply_version_policy(filename: &str, version: &str, versioned: bool) -> String {
    if versioned {
        insert_version(filename, version)
    } else {
        strip_version(filename, version)
    }
}

/// Splice the version into a filename that does not already carry it
pub fn insert_version(filename: &str, version: &str) -> String {
    if version.is_empty() || filename.contains(version) {
        return filename.to_string();
    }

    let (stem, extension) = split_extension(filename);
    match remove_min_marker(stem) {
        Some(base) => format!("{base}-{version}.{MIN_MARKER}{extension}"),
        None => format!("{stem}-{version}{extension}"),
    }
}

/// Remove the version (hyphen-prefixed or bare) wherever it occurs
pub fn strip_version(filename: &str, version: &str) -> String {
    if version.is_empty() {
        return filename.to_string();
    }

    let mut stripped = filename
        .replace(&format!("-{version}"), "")
        .replace(version, "");

    while stripped.contains("..") {
        stripped = stripped.replace("..", ".");
    }

    let (stem, _) = split_extension(&stripped);
    if stem.is_empty() || stem.starts_with('.') || stem == "-" {
        return filename.to_string();
    }

    stripped
}

/// Split `name.ext` into (`name`, `.ext`); dotfiles and bare names have no extension
fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(0) | None => (filename, ""),
        Some(idx) => filename.split_at(idx),
    }
}

/// Stem with its `.min` dot-segment removed, if it has one
fn remove_min_marker(stem: &str) -> Option<String> {
    let segments: Vec<&str> = stem.split('.').collect();
    let position = segments
        .iter()
        .skip(1)
        .position(|s| *s == MIN_MARKER)
        .map(|p| p + 1)?;

    let remaining: Vec<&str> = segments
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != position)
        .map(|(_, s)| *s)
        .collect();

    Some(remaining.join("."))
}

/// Join a section folder and filename under `root` into a normalized absolute path
pub fn destination_path(root: &Path, folder: &str, filename: &str) -> PathBuf {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    normalize_path(&root.join(folder).join(filename))
}

/// Resolve a folder from the manifest against the project root
pub fn folder_path(root: &Path, folder: &str) -> PathBuf {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    normalize_path(&root.join(folder))
}

/// Lexically remove `.` and `..` components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(versioned: bool) -> DownloadPolicy {
        DownloadPolicy {
            version_in_filename: versioned,
            ..Default::default()
        }
    }

    #[test]
    fn test_substitute_every_placeholder() {
        assert_eq!(
            substitute_version("https://x/{version}/lib-{version}.js", "1.0"),
            "https://x/1.0/lib-1.0.js"
        );
    }

    #[test]
    fn test_url_basename() {
        assert_eq!(
            url_basename("https://x/a/jquery-3.2.1.js?v=1#top").as_deref(),
            Some("jquery-3.2.1.js")
        );
        assert_eq!(url_basename("https://x/a/").as_deref(), None);
        assert_eq!(url_basename("x/a/lib.js").as_deref(), Some("lib.js"));
    }

    #[test]
    fn test_min_marker_must_be_a_whole_segment() {
        assert_eq!(remove_min_marker("jquery.min").as_deref(), Some("jquery"));
        assert_eq!(remove_min_marker("jquery.mini"), None);
        assert_eq!(remove_min_marker("min"), None);
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.min.js"), ("a.min", ".js"));
        assert_eq!(split_extension("LICENSE"), ("LICENSE", ""));
        assert_eq!(split_extension(".bowerrc"), (".bowerrc", ""));
    }

    #[test]
    fn test_license_ignores_policy() {
        let entry = CatalogEntry::new("jquery", "3.2.1").with_license("https://x/LICENSE-{version}.txt");

        for versioned in [true, false] {
            let name = resolve_filename(&entry, Variant::License, &policy(versioned)).unwrap();
            assert_eq!(name.filename, "jquery.license");
            assert_eq!(name.url, "https://x/LICENSE-3.2.1.txt");
        }
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/p/./app/js/../css/site.css")),
            PathBuf::from("/p/app/css/site.css")
        );
    }
}
