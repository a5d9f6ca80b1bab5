//! On-disk drift polling
//!
//! A drift check re-reads only a bounded prefix of the canon file to parse
//! the version header; it never does a structural reparse. It is meant to
//! run frequently, so every failure mode maps to "no drift signal" rather
//! than an error the caller must handle.

use crate::resolve::PathResolver;
use canon_document::{extract_version, SemanticVersion};
use tokio::io::AsyncReadExt;

/// Bytes of file prefix read during a drift check.
///
/// The header must be the first non-blank line, so this is always enough
/// for a well-formed canon.
pub const HEADER_READ_LIMIT: u64 = 4096;

/// Cheap, read-only poll for on-disk version changes
#[derive(Debug, Clone)]
pub struct DriftDetector {
    resolver: PathResolver,
}

impl DriftDetector {
    /// Create a detector that re-resolves the canon path on every check
    #[inline]
    #[must_use]
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Check whether the on-disk version differs from `current`.
    ///
    /// Returns `Some(on_disk)` only when a version was parsed and differs.
    /// Missing file, unreadable file, malformed header all return `None`;
    /// a transient failure during a poll is not a reload trigger.
    pub async fn check(&self, current: SemanticVersion) -> Option<SemanticVersion> {
        let path = match self.resolver.resolve() {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(error = %e, "drift check could not resolve canon path");
                return None;
            }
        };

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!(error = %e, path = %path.display(), "drift check could not open canon");
                return None;
            }
        };

        let mut prefix = Vec::with_capacity(HEADER_READ_LIMIT as usize);
        let mut reader = file.take(HEADER_READ_LIMIT);
        if let Err(e) = reader.read_to_end(&mut prefix).await {
            tracing::debug!(error = %e, path = %path.display(), "drift check read failed");
            return None;
        }

        // The prefix may cut a multi-byte character; the header is ASCII so
        // lossy conversion cannot corrupt it.
        let prefix = String::from_utf8_lossy(&prefix);
        match extract_version(&prefix) {
            Ok(on_disk) if on_disk != current => {
                tracing::debug!(current = %current, on_disk = %on_disk, "canon drift detected");
                Some(on_disk)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "drift check could not parse header");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn detector_for(dir: &TempDir) -> (DriftDetector, std::path::PathBuf) {
        let path = dir.path().join("canon.md");
        let resolver = PathResolver::new(None, &path);
        (DriftDetector::new(resolver), path)
    }

    #[tokio::test]
    async fn no_drift_when_versions_match() {
        let dir = TempDir::new().unwrap();
        let (detector, path) = detector_for(&dir);
        fs::write(&path, "PIPELINE_FLOW_VERSION=1.0\nbody\n").unwrap();

        assert_eq!(detector.check(SemanticVersion::new(1, 0)).await, None);
    }

    #[tokio::test]
    async fn drift_reports_on_disk_version() {
        let dir = TempDir::new().unwrap();
        let (detector, path) = detector_for(&dir);
        fs::write(&path, "PIPELINE_FLOW_VERSION=1.1\nbody\n").unwrap();

        assert_eq!(
            detector.check(SemanticVersion::new(1, 0)).await,
            Some(SemanticVersion::new(1, 1))
        );
    }

    #[tokio::test]
    async fn missing_file_is_no_signal() {
        let dir = TempDir::new().unwrap();
        let (detector, _path) = detector_for(&dir);

        assert_eq!(detector.check(SemanticVersion::new(1, 0)).await, None);
    }

    #[tokio::test]
    async fn malformed_header_is_no_signal() {
        let dir = TempDir::new().unwrap();
        let (detector, path) = detector_for(&dir);
        fs::write(&path, "not a header\n").unwrap();

        assert_eq!(detector.check(SemanticVersion::new(1, 0)).await, None);
    }

    #[tokio::test]
    async fn check_reads_only_the_prefix() {
        let dir = TempDir::new().unwrap();
        let (detector, path) = detector_for(&dir);

        // Body far larger than the prefix limit; header still parses
        let mut content = String::from("PIPELINE_FLOW_VERSION=2.0\n");
        content.push_str(&"x".repeat(64 * 1024));
        fs::write(&path, content).unwrap();

        assert_eq!(
            detector.check(SemanticVersion::new(1, 0)).await,
            Some(SemanticVersion::new(2, 0))
        );
    }
}
