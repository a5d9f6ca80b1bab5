//! Testing utilities for the canon workspace
//!
//! Shared fixtures: well-formed canon documents, on-disk canon setup, and
//! service construction with test-friendly reclamation knobs.

#![allow(missing_docs)]

use canon_document::{SemanticVersion, REQUIRED_SECTIONS};
use canon_service::{CanonConfig, CanonService};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A complete, valid canon document for the given version.
pub fn canon_fixture(version: SemanticVersion) -> String {
    canon_fixture_with_body(version, "Stage descriptions live here.")
}

/// A complete canon with custom body text under each section, so two
/// fixtures of the same version can still differ in content.
pub fn canon_fixture_with_body(version: SemanticVersion, body: &str) -> String {
    let mut doc = format!("PIPELINE_FLOW_VERSION={version}\n\n");
    for (i, section) in REQUIRED_SECTIONS.iter().enumerate() {
        doc.push_str(&format!("## {}. {section}\n\n{body}\n\n", i + 1));
    }
    doc
}

/// A canon missing the named sections; everything else intact.
pub fn canon_fixture_missing(version: SemanticVersion, missing: &[&str]) -> String {
    let mut doc = format!("PIPELINE_FLOW_VERSION={version}\n\n");
    for section in REQUIRED_SECTIONS.iter().filter(|s| !missing.contains(*s)) {
        doc.push_str(&format!("## {section}\n\nBody.\n\n"));
    }
    doc
}

/// Write canon content into `dir` and return the file path.
pub fn write_canon(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("pipeline_flow.md");
    fs::write(&path, content).expect("write canon fixture");
    path
}

/// Config pointed at `canon_path` with reclamation tightened enough for
/// tests to observe retirement without multi-second sleeps.
pub fn test_config(canon_path: &Path) -> CanonConfig {
    CanonConfig::new()
        .with_canon_path(canon_path)
        .with_reap_interval(Duration::from_millis(5))
        .with_drain_ceiling(Duration::from_secs(60))
}

/// Service over a canon of `version` written into `dir`. The service is not
/// yet loaded; call `initial_load` in the test.
pub fn setup_service(dir: &Path, version: SemanticVersion) -> CanonService {
    let path = write_canon(dir, &canon_fixture(version));
    CanonService::new(test_config(&path))
}
