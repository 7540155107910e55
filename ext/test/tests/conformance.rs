//! Conformance tests that run YAML fixtures against portcullis
//!
//! Run with: cargo test -p portcullis-test --test conformance --features fixtures

#![cfg(feature = "fixtures")]

use portcullis_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load and run every fixture in one file.
fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(name);
    let yaml = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));

    // Files may hold several fixtures separated by ---
    let fixtures = Fixture::from_yaml_multi(&yaml)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {e}", path.display()));
    assert!(!fixtures.is_empty(), "{} holds no fixtures", path.display());

    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_and() {
    run_fixture_file("01_and.yaml");
}

#[test]
fn test_or() {
    run_fixture_file("02_or.yaml");
}

#[test]
fn test_not() {
    run_fixture_file("03_not.yaml");
}

#[test]
fn test_sentinels() {
    run_fixture_file("04_all_none.yaml");
}

#[test]
fn test_attributes() {
    run_fixture_file("05_attributes.yaml");
}

#[test]
fn test_terminate_propagation() {
    run_fixture_file("06_terminate.yaml");
}

#[test]
fn test_config_errors() {
    run_fixture_file("07_config_errors.yaml");
}

#[test]
fn every_fixture_file_is_wired() {
    let mut files: Vec<String> = fs::read_dir(fixtures_dir())
        .expect("read fixtures dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".yaml"))
        .collect();
    files.sort();
    assert_eq!(
        files,
        [
            "01_and.yaml",
            "02_or.yaml",
            "03_not.yaml",
            "04_all_none.yaml",
            "05_attributes.yaml",
            "06_terminate.yaml",
            "07_config_errors.yaml",
        ]
    );
}
