//! Manifest Source Integration Tests
//!
//! Tests for locating the manifest (embedded descriptor vs standalone file)
//! and for writing starter manifests.

use std::fs;

use tempfile::TempDir;
use upm::config::ProjectFiles;
use upm::domain::{ManifestError, ManifestTemplate};
use upm::{Manifest, ManifestSource};

#[test]
fn test_embedded_descriptor_takes_precedence() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("package.json"),
        r#"{
            "name": "web-app",
            "libraries": {
                "minified": false,
                "./public/js/": { "angular": "" }
            }
        }"#,
    )
    .unwrap();
    fs::write(
        temp.path().join("upm.json"),
        r#"{ "./app/js/": { "jquery": "" } }"#,
    )
    .unwrap();

    let source = ManifestSource::discover(temp.path(), &ProjectFiles::default()).unwrap();
    assert_eq!(source, ManifestSource::Embedded(temp.path().join("package.json")));

    let manifest = source.load().unwrap();
    assert_eq!(manifest.sections.len(), 1);
    assert_eq!(manifest.sections[0].target, "./public/js/");
    assert_eq!(manifest.sections[0].libraries[0].name, "angular");
    assert!(!manifest.policy.include_minified);
}

#[test]
fn test_descriptor_without_libraries_falls_back_to_standalone() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("package.json"), r#"{ "name": "web-app" }"#).unwrap();
    fs::write(
        temp.path().join("upm.json"),
        r#"{ "./app/js/": { "jquery": "" } }"#,
    )
    .unwrap();

    let source = ManifestSource::discover(temp.path(), &ProjectFiles::default()).unwrap();
    assert_eq!(source, ManifestSource::Standalone(temp.path().join("upm.json")));
    assert_eq!(source.load().unwrap().sections[0].target, "./app/js/");
}

#[test]
fn test_broken_descriptor_is_ignored() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("package.json"), "{ this is not json").unwrap();
    fs::write(temp.path().join("upm.json"), r#"{ "./js/": {} }"#).unwrap();

    let source = ManifestSource::discover(temp.path(), &ProjectFiles::default()).unwrap();
    assert!(matches!(source, ManifestSource::Standalone(_)));
}

#[test]
fn test_no_manifest_at_all() {
    let temp = TempDir::new().unwrap();
    assert!(ManifestSource::discover(temp.path(), &ProjectFiles::default()).is_none());
}

#[test]
fn test_invalid_embedded_manifest_is_fatal() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("package.json"),
        r#"{ "libraries": ["jquery"] }"#,
    )
    .unwrap();

    let source = ManifestSource::discover(temp.path(), &ProjectFiles::default()).unwrap();
    assert!(matches!(source.load(), Err(ManifestError::Invalid(_))));
}

#[test]
fn test_invalid_standalone_manifest_is_fatal() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("upm.json"), r#"{ "./js/": { "jquery": "" }"#).unwrap();

    let source = ManifestSource::discover(temp.path(), &ProjectFiles::default()).unwrap();
    assert!(matches!(source.load(), Err(ManifestError::Invalid(_))));
}

#[test]
fn test_custom_file_names() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("assets.json"), r#"{ "./js/": { "jquery": "" } }"#).unwrap();

    let files = ProjectFiles {
        manifest: "assets.json".to_string(),
        ..Default::default()
    };

    let source = ManifestSource::discover(temp.path(), &files).unwrap();
    assert_eq!(source.path(), temp.path().join("assets.json"));
}

#[test]
fn test_written_templates_are_loadable() {
    let temp = TempDir::new().unwrap();

    for template in [ManifestTemplate::Sample, ManifestTemplate::Empty] {
        let path = temp.path().join("upm.json");
        template.write(&path).unwrap();

        let manifest = ManifestSource::Standalone(path).load().unwrap();
        assert!(!manifest.is_empty());
        assert_eq!(manifest, Manifest::from_value(&template.document()).unwrap());
    }
}
