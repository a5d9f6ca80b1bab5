//! Canon document model
//!
//! The canon is the single shared, versioned markdown document the rest of
//! the platform reads its pipeline behavior from. This crate holds the pure
//! parts of the version management system:
//!
//! - **Version header**: strict `PIPELINE_FLOW_VERSION=<major>.<minor>`
//!   extraction from the first non-blank line
//! - **Comparator**: total three-way comparison of two semantic versions
//! - **Structure**: the required-section catalog and the heading scan that
//!   validates a document against it
//! - **Document**: the immutable in-memory representation of one load
//!
//! Nothing here touches the filesystem; the loading boundary lives in
//! `canon-loader`.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod document;
pub mod sections;
pub mod version;

// Re-exports for convenience
pub use document::CanonDocument;
pub use sections::{missing_sections, normalize_title, scan_headings, Heading, REQUIRED_SECTIONS};
pub use version::{extract_version, SemanticVersion, VersionDelta, VersionParseError, VERSION_PREFIX};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
