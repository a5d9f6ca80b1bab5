//! Size-bounded canon loading
//!
//! The loader reads one file into an immutable [`CanonDocument`]. Oversized
//! files are rejected from metadata alone, before any content reaches
//! memory. Structural validation reports every missing section in one
//! error, not just the first.

use canon_document::{extract_version, missing_sections, CanonDocument, VersionParseError};
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};

/// Canon size ceiling (1 MiB)
pub const MAX_CANON_BYTES: u64 = 1024 * 1024;

/// Canon load errors
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File vanished between resolution and load
    #[error("canon file not found: {0}")]
    FileNotFound(PathBuf),

    /// Underlying read failure
    #[error("io error reading canon {path}: {source}")]
    Io {
        /// Path being read
        path: PathBuf,
        /// Originating error
        source: io::Error,
    },

    /// Version header missing or malformed
    #[error("canon parse failed: {0}")]
    Parse(#[from] VersionParseError),

    /// File exceeds the size ceiling; rejected before reading content
    #[error("canon file too large: {size} bytes (max: {limit})")]
    Oversize {
        /// Actual size on disk
        size: u64,
        /// Configured ceiling
        limit: u64,
    },

    /// Required sections absent; carries every missing name
    #[error("canon missing required sections: {}", .0.join(", "))]
    MissingSections(Vec<String>),
}

impl LoadError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::FileNotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Reads canon files into immutable documents.
///
/// Stateless apart from the configured ceiling; caching of "current" lives
/// one layer up, in the buffer manager.
#[derive(Debug, Clone, Copy)]
pub struct Loader {
    max_bytes: u64,
}

impl Loader {
    /// Create a loader with the standard 1 MiB ceiling
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_bytes: MAX_CANON_BYTES,
        }
    }

    /// Create a loader with a specific ceiling
    #[inline]
    #[must_use]
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Load and validate the canon at `path`.
    ///
    /// The size check runs against file metadata first, so a runaway file
    /// never gets read into memory.
    ///
    /// # Errors
    /// - [`LoadError::FileNotFound`] / [`LoadError::Io`] on read failures
    /// - [`LoadError::Oversize`] if the file exceeds the ceiling
    /// - [`LoadError::Parse`] if the version header is missing or malformed
    /// - [`LoadError::MissingSections`] listing every absent section
    pub async fn load(&self, path: &Path) -> Result<CanonDocument, LoadError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| LoadError::io(path, e))?;

        if metadata.len() > self.max_bytes {
            return Err(LoadError::Oversize {
                size: metadata.len(),
                limit: self.max_bytes,
            });
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LoadError::io(path, e))?;

        let version = extract_version(&content)?;

        let missing = missing_sections(&content);
        if !missing.is_empty() {
            return Err(LoadError::MissingSections(missing));
        }

        tracing::debug!(version = %version, bytes = content.len(), path = %path.display(), "canon loaded");

        Ok(CanonDocument::new(
            version,
            content,
            Utc::now(),
            path.to_path_buf(),
        ))
    }

    /// Configured size ceiling in bytes
    #[inline]
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
