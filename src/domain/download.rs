//! Variants and resolved downloads.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A distinct artifact a catalog entry may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Original,
    Minified,
    License,
}

impl Variant {
    /// Download order within a library
    pub const ALL: [Variant; 3] = [Variant::Original, Variant::Minified, Variant::License];

    /// The build to try when this one is missing (none for licenses)
    pub fn counterpart(self) -> Option<Variant> {
        match self {
            Variant::Original => Some(Variant::Minified),
            Variant::Minified => Some(Variant::Original),
            Variant::License => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variant::Original => "original",
            Variant::Minified => "minified",
            Variant::License => "license",
        };
        f.write_str(name)
    }
}

/// A single transfer ready to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDownload {
    /// Library name as requested in the manifest
    pub library: String,

    /// Section key the library was requested under
    pub section: String,

    /// Variant that was requested
    pub variant: Variant,

    /// URL to fetch
    pub source_url: String,

    /// Absolute path to write
    pub destination: PathBuf,
}
