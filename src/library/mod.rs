//! Library catalog lookup.
//!
//! The catalog maps library names to URL templates for their original,
//! minified and license files. It is loaded once per run, from a local
//! `libraries.json` override when present, otherwise from the canonical
//! remote document, and shared read-only afterwards.

pub mod catalog;

pub use catalog::{Catalog, CatalogEntry, CatalogError, CatalogSource, VERSION_TOKEN};
