#![cfg(feature = "cli")]

use std::fs;

use folio::render::to_html;
use folio::{Config, Error, Pipeline};

#[test]
fn test_config_file_drives_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("folio.json");
    fs::write(
        &path,
        r#"{ "embeds": false, "sanitize": { "attributes": { "p": ["class"] } } }"#,
    )
    .unwrap();

    let config = Config::from_path(&path).unwrap();
    assert!(!config.embeds);

    let pipeline = Pipeline::new(&config);
    assert_eq!(pipeline.stage_names(), ["normalize", "toc", "sanitize"]);

    let rendered = pipeline.render("https://youtu.be/abc123").unwrap();
    assert!(!to_html(&rendered.tree).contains("<iframe"));
}

#[test]
fn test_malformed_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("folio.json");
    fs::write(&path, "{ embeds: yes }").unwrap();

    let err = Config::from_path(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().starts_with("invalid configuration:"));
}

#[test]
fn test_tracker_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("folio.json");
    fs::write(
        &path,
        r#"{ "tracker": { "anchorOffset": 64, "band": { "thresholds": [0, 1] } } }"#,
    )
    .unwrap();

    let config = Config::from_path(&path).unwrap();
    assert!(config.embeds);
    assert_eq!(config.tracker.anchor_offset, 64.0);
    assert_eq!(config.tracker.activation_offset, 150.0);
    assert_eq!(config.tracker.band.thresholds, [0.0, 1.0]);
}
