//! Download policy: which variants to fetch and how to name them.

use serde::{Deserialize, Serialize};

use super::download::Variant;

/// Naming and inclusion flags for a manifest (or one of its sections)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadPolicy {
    /// Fetch the unminified build
    pub include_original: bool,

    /// Fetch the minified build
    pub include_minified: bool,

    /// Fetch the license file
    pub include_license: bool,

    /// Keep (or add) the version string in written filenames
    pub version_in_filename: bool,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            include_original: true,
            include_minified: true,
            include_license: false,
            version_in_filename: false,
        }
    }
}

impl DownloadPolicy {
    /// Whether a variant is requested under this policy
    pub fn is_enabled(&self, variant: Variant) -> bool {
        match variant {
            Variant::Original => self.include_original,
            Variant::Minified => self.include_minified,
            Variant::License => self.include_license,
        }
    }

    /// Variants to fetch, in download order
    pub fn enabled_variants(&self) -> Vec<Variant> {
        Variant::ALL
            .into_iter()
            .filter(|v| self.is_enabled(*v))
            .collect()
    }

    /// Apply per-section overrides on top of this policy
    pub fn with_overrides(&self, overrides: &PolicyOverrides) -> Self {
        Self {
            include_original: overrides.original.unwrap_or(self.include_original),
            include_minified: overrides.minified.unwrap_or(self.include_minified),
            include_license: overrides.license.unwrap_or(self.include_license),
            version_in_filename: overrides.version.unwrap_or(self.version_in_filename),
        }
    }
}

/// Optional replacements for individual policy flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    pub original: Option<bool>,
    pub minified: Option<bool>,
    pub license: Option<bool>,
    pub version: Option<bool>,
}

/// Policy keys recognized in a manifest, with their aliases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKey {
    Original,
    Minified,
    License,
    Version,
}

impl PolicyKey {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "original" => Some(Self::Original),
            "minified" => Some(Self::Minified),
            "license" | "licenses" => Some(Self::License),
            "version" | "filenames" => Some(Self::Version),
            _ => None,
        }
    }

    /// Store a boolean for this key into an override set
    pub fn set(self, overrides: &mut PolicyOverrides, value: bool) {
        match self {
            Self::Original => overrides.original = Some(value),
            Self::Minified => overrides.minified = Some(value),
            Self::License => overrides.license = Some(value),
            Self::Version => overrides.version = Some(value),
        }
    }
}

/// Parse the string form of the `version`/`filenames` flag
pub fn parse_version_naming(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "versioned" | "original" | "true" => Some(true),
        "stripped" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = DownloadPolicy::default();
        assert!(policy.include_original);
        assert!(policy.include_minified);
        assert!(!policy.include_license);
        assert!(!policy.version_in_filename);
        assert_eq!(
            policy.enabled_variants(),
            vec![Variant::Original, Variant::Minified]
        );
    }

    #[test]
    fn test_overrides_only_touch_set_flags() {
        let policy = DownloadPolicy::default();
        let overrides = PolicyOverrides {
            minified: Some(false),
            license: Some(true),
            ..Default::default()
        };

        let merged = policy.with_overrides(&overrides);
        assert!(merged.include_original);
        assert!(!merged.include_minified);
        assert!(merged.include_license);
        assert!(!merged.version_in_filename);
    }

    #[test]
    fn test_policy_key_aliases() {
        assert_eq!(PolicyKey::from_key("licenses"), Some(PolicyKey::License));
        assert_eq!(PolicyKey::from_key("filenames"), Some(PolicyKey::Version));
        assert_eq!(PolicyKey::from_key("jquery"), None);
    }

    #[test]
    fn test_version_naming_strings() {
        assert_eq!(parse_version_naming("versioned"), Some(true));
        assert_eq!(parse_version_naming("Original"), Some(true));
        assert_eq!(parse_version_naming("stripped"), Some(false));
        assert_eq!(parse_version_naming("sometimes"), None);
    }
}
