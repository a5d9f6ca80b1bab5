//! Canon version header
//!
//! The version is a `major.minor` pair carried on the first non-blank line
//! of the canon document. Placement is strict so that drift polling can
//! extract it without reading the whole file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Literal prefix of the mandatory version header line
pub const VERSION_PREFIX: &str = "PIPELINE_FLOW_VERSION=";

/// Canon semantic version (`major.minor`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SemanticVersion {
    /// Major version component
    pub major: u32,
    /// Minor version component
    pub minor: u32,
}

impl SemanticVersion {
    /// Create a version from its components
    #[inline]
    #[must_use]
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Compare `self` (the in-memory version) against a candidate
    /// (typically the on-disk version).
    ///
    /// Total over all pairs: every comparison yields exactly one of the
    /// three outcomes.
    #[inline]
    #[must_use]
    pub fn delta(self, candidate: Self) -> VersionDelta {
        if self == candidate {
            VersionDelta::Same
        } else if candidate.major > self.major
            || (candidate.major == self.major && candidate.minor > self.minor)
        {
            VersionDelta::Upgrade
        } else {
            VersionDelta::Downgrade
        }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `u32::from_str` tolerates a leading `+`; the header format does
        // not, so components must be bare digits.
        fn component(part: &str) -> Option<u32> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse().ok()
        }

        let malformed = || VersionParseError::MalformedHeader(s.to_string());
        let (major, minor) = s.split_once('.').ok_or_else(malformed)?;
        let major = component(major).ok_or_else(malformed)?;
        let minor = component(minor).ok_or_else(malformed)?;
        Ok(Self { major, minor })
    }
}

/// Outcome of comparing the current version against a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionDelta {
    /// Candidate is identical
    Same,
    /// Candidate is newer
    Upgrade,
    /// Candidate is older
    Downgrade,
}

/// Version header parse errors
#[derive(Debug, thiserror::Error)]
pub enum VersionParseError {
    /// Document has no non-blank line at all
    #[error("canon document has no version header line")]
    MissingHeader,

    /// First non-blank line is not a well-formed version header
    #[error("malformed version header: {0:?} (expected {prefix}<major>.<minor>)", prefix = VERSION_PREFIX)]
    MalformedHeader(String),
}

/// Extract the version from canon content.
///
/// The *first non-blank line* must be exactly
/// `PIPELINE_FLOW_VERSION=<major>.<minor>`; a version header anywhere else
/// in the document does not count. Strict placement keeps extraction cheap
/// for callers that only see a prefix of the file.
///
/// # Errors
/// - [`VersionParseError::MissingHeader`] if the content is all blank
/// - [`VersionParseError::MalformedHeader`] if the line does not match
pub fn extract_version(content: &str) -> Result<SemanticVersion, VersionParseError> {
    // Blankness is judged on the trimmed line, but the header itself must
    // start at column zero: an indented header is malformed, not blank.
    let line = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or(VersionParseError::MissingHeader)?;

    let raw = line
        .strip_prefix(VERSION_PREFIX)
        .ok_or_else(|| VersionParseError::MalformedHeader(line.to_string()))?;

    raw.parse()
        .map_err(|_| VersionParseError::MalformedHeader(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn version_display_roundtrip() {
        let v = SemanticVersion::new(2, 7);
        assert_eq!(v.to_string(), "2.7");
        assert_eq!("2.7".parse::<SemanticVersion>().unwrap(), v);
    }

    #[test]
    fn version_from_str_rejects_garbage() {
        assert!("2".parse::<SemanticVersion>().is_err());
        assert!("2.x".parse::<SemanticVersion>().is_err());
        assert!("a.1".parse::<SemanticVersion>().is_err());
        assert!("".parse::<SemanticVersion>().is_err());
        assert!("-1.0".parse::<SemanticVersion>().is_err());
    }

    #[test]
    fn version_from_str_rejects_signed_components() {
        assert!("+1.0".parse::<SemanticVersion>().is_err());
        assert!("1.+0".parse::<SemanticVersion>().is_err());
        assert!(" 1.0".parse::<SemanticVersion>().is_err());
        assert!("1.0 ".parse::<SemanticVersion>().is_err());
    }

    #[test]
    fn delta_same() {
        let v = SemanticVersion::new(1, 2);
        assert_eq!(v.delta(v), VersionDelta::Same);
    }

    #[test]
    fn delta_upgrade_minor_and_major() {
        let v = SemanticVersion::new(1, 2);
        assert_eq!(v.delta(SemanticVersion::new(1, 3)), VersionDelta::Upgrade);
        assert_eq!(v.delta(SemanticVersion::new(2, 0)), VersionDelta::Upgrade);
    }

    #[test]
    fn delta_downgrade() {
        let v = SemanticVersion::new(1, 2);
        assert_eq!(v.delta(SemanticVersion::new(1, 1)), VersionDelta::Downgrade);
        assert_eq!(v.delta(SemanticVersion::new(0, 9)), VersionDelta::Downgrade);
    }

    #[test]
    fn extract_version_skips_blank_lines() {
        let content = "\n  \n\nPIPELINE_FLOW_VERSION=3.1\n# Overview\n";
        let v = extract_version(content).unwrap();
        assert_eq!(v, SemanticVersion::new(3, 1));
    }

    #[test]
    fn extract_version_rejects_indented_header() {
        let content = "  PIPELINE_FLOW_VERSION=1.0\n# Overview\n";
        assert!(matches!(
            extract_version(content),
            Err(VersionParseError::MalformedHeader(_))
        ));
    }

    #[test]
    fn extract_version_rejects_signed_version() {
        assert!(extract_version("PIPELINE_FLOW_VERSION=+1.0\n").is_err());
    }

    #[test]
    fn extract_version_rejects_other_first_line() {
        // Header present but not first - strict placement
        let content = "# Overview\nPIPELINE_FLOW_VERSION=1.0\n";
        assert!(matches!(
            extract_version(content),
            Err(VersionParseError::MalformedHeader(_))
        ));
    }

    #[test]
    fn extract_version_rejects_trailing_content() {
        let content = "PIPELINE_FLOW_VERSION=1.0 extra\n";
        assert!(extract_version(content).is_err());
    }

    #[test]
    fn extract_version_empty_document() {
        assert!(matches!(
            extract_version("\n \n"),
            Err(VersionParseError::MissingHeader)
        ));
    }

    proptest! {
        #[test]
        fn prop_delta_is_total_and_exclusive(a in 0u32..50, b in 0u32..50, c in 0u32..50, d in 0u32..50) {
            let x = SemanticVersion::new(a, b);
            let y = SemanticVersion::new(c, d);
            let delta = x.delta(y);

            match delta {
                VersionDelta::Same => prop_assert_eq!(x, y),
                VersionDelta::Upgrade => prop_assert!(y > x),
                VersionDelta::Downgrade => prop_assert!(y < x),
            }
        }

        #[test]
        fn prop_header_roundtrip(a in 0u32..1000, b in 0u32..1000) {
            let content = format!("PIPELINE_FLOW_VERSION={a}.{b}\nbody");
            let v = extract_version(&content).unwrap();
            prop_assert_eq!(v, SemanticVersion::new(a, b));
        }
    }
}
